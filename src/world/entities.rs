use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::world::coord::Coordinate;
use crate::world::tile::Terrain;

// === Identifiers ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BiomeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimalId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EggId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

// === Species ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Buffalo,
    Bird,
    Turtle,
    Octopus,
    Snake,
}

impl Species {
    pub const ALL: [Species; 5] = [
        Species::Buffalo,
        Species::Bird,
        Species::Turtle,
        Species::Octopus,
        Species::Snake,
    ];

    /// Species that hatches from an egg laid on `terrain`. Snakes hatch
    /// wherever the terrain is unknown.
    pub fn for_terrain(terrain: Option<Terrain>) -> Species {
        match terrain {
            Some(Terrain::Grass) => Species::Buffalo,
            Some(Terrain::Mountain) => Species::Bird,
            Some(Terrain::Water) => Species::Turtle,
            Some(Terrain::Underwater) => Species::Octopus,
            Some(Terrain::Beach) | None => Species::Snake,
        }
    }

    /// Maximum number of steps per move.
    pub fn movement_range(self) -> u32 {
        match self {
            Species::Buffalo => 2,
            Species::Bird => 3,
            Species::Turtle => 2,
            Species::Octopus => 2,
            Species::Snake => 2,
        }
    }

    pub fn can_enter(self, terrain: Terrain) -> bool {
        match self {
            Species::Buffalo => matches!(terrain, Terrain::Grass | Terrain::Beach),
            Species::Bird => !matches!(terrain, Terrain::Underwater),
            Species::Turtle => matches!(terrain, Terrain::Water | Terrain::Beach),
            Species::Octopus => matches!(terrain, Terrain::Underwater | Terrain::Water),
            Species::Snake => matches!(
                terrain,
                Terrain::Beach | Terrain::Grass | Terrain::Mountain
            ),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Buffalo => "buffalo",
            Species::Bird => "bird",
            Species::Turtle => "turtle",
            Species::Octopus => "octopus",
            Species::Snake => "snake",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// Facing after travelling `dx` columns; vertical moves keep the old facing.
    pub fn after_step(self, dx: i32) -> Facing {
        match dx.signum() {
            1 => Facing::Right,
            -1 => Facing::Left,
            _ => self,
        }
    }
}

// === Animal / Egg ===

/// An active (hatched) creature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub species: Species,
    pub position: Coordinate,
    pub previous_position: Option<Coordinate>,
    pub has_moved: bool,
    pub owner_id: Option<PlayerId>,
    pub facing: Facing,
}

impl Animal {
    pub fn new(id: AnimalId, species: Species, position: Coordinate, owner_id: Option<PlayerId>) -> Self {
        Self {
            id,
            species,
            position,
            previous_position: None,
            has_moved: false,
            owner_id,
            facing: Facing::Right,
        }
    }

    /// Relocate, remembering where the animal came from.
    pub fn relocate(&mut self, to: Coordinate) {
        let dx = to.x - self.position.x;
        self.previous_position = Some(self.position);
        self.position = to;
        self.facing = self.facing.after_step(dx);
    }
}

/// A dormant placeholder that becomes an [`Animal`] when hatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Egg {
    pub id: EggId,
    pub owner_id: PlayerId,
    pub position: Coordinate,
    pub biome_id: BiomeId,
    pub created_at_turn: u32,
}

// === Resources ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Berries,
    Kelp,
    Ore,
    Coral,
}

impl ResourceKind {
    /// Resource grown by a terrain type; beaches grow nothing.
    pub fn for_terrain(terrain: Terrain) -> Option<ResourceKind> {
        match terrain {
            Terrain::Grass => Some(ResourceKind::Berries),
            Terrain::Water => Some(ResourceKind::Kelp),
            Terrain::Mountain => Some(ResourceKind::Ore),
            Terrain::Underwater => Some(ResourceKind::Coral),
            Terrain::Beach => None,
        }
    }
}

/// A renewable resource. `active` always mirrors `value > 0`; both are
/// only changed through [`Resource::set_value`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub position: Coordinate,
    pub biome_id: Option<BiomeId>,
    value: f32,
    active: bool,
}

impl Resource {
    pub fn new(
        id: ResourceId,
        kind: ResourceKind,
        position: Coordinate,
        biome_id: Option<BiomeId>,
        value: f32,
    ) -> Self {
        let mut r = Self {
            id,
            kind,
            position,
            biome_id,
            value: 0.0,
            active: false,
        };
        r.set_value(value);
        r
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_value(&mut self, value: f32) {
        let v = if value.is_finite() { value.max(0.0) } else { 0.0 };
        self.value = v;
        self.active = v > 0.0;
    }
}

// === Player ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: u32,
    pub is_active: bool,
    pub energy: f32,
    /// Tiles currently in sight.
    pub visible_tiles: BTreeSet<Coordinate>,
    /// Every tile ever seen while fog of war was on. Never shrinks.
    pub explored_tiles: BTreeSet<Coordinate>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, color: u32) -> Self {
        Self {
            id,
            name: name.into(),
            color,
            is_active: true,
            energy: 0.0,
            visible_tiles: BTreeSet::new(),
            explored_tiles: BTreeSet::new(),
        }
    }
}
