use serde::Serialize;

use crate::world::coord::Coordinate;
use crate::world::entities::{AnimalId, BiomeId};

/// An active unit was pushed off a tile it was blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplacementEvent {
    pub unit_id: AnimalId,
    pub from: Coordinate,
    pub to: Coordinate,
    pub timestamp: u64,
}

/// An egg hatched into a new unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpawnEvent {
    pub unit_id: AnimalId,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BiomeCaptureEvent {
    pub biome_id: BiomeId,
    pub timestamp: u64,
}

/// Single-slot transient events. A consumer takes (clears) each event after
/// acting on it; a newer event of the same kind overwrites an unread one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventSlots {
    pub displacement: Option<DisplacementEvent>,
    pub spawn: Option<SpawnEvent>,
    pub capture: Option<BiomeCaptureEvent>,
}

impl EventSlots {
    pub fn is_empty(&self) -> bool {
        self.displacement.is_none() && self.spawn.is_none() && self.capture.is_none()
    }

    pub fn clear(&mut self) {
        *self = EventSlots::default();
    }
}
