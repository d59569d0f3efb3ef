use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rand_chacha::ChaCha8Rng;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::config::generation::GenerationParams;
use crate::error::{SimError, SimResult};
use crate::simulation::events::EventSlots;
use crate::simulation::turn::{TurnPhase, TurnState};
use crate::world::biome::Biome;
use crate::world::coord::Coordinate;
use crate::world::entities::{
    Animal, AnimalId, BiomeId, Egg, EggId, Player, PlayerId, Resource,
};
use crate::world::generation::GeneratedWorld;
use crate::world::tile::Board;

/// The authoritative simulation snapshot.
///
/// Operations never mutate a published `GameState`; they read one and build
/// the next. The board is shared between versions.
#[derive(Debug, Clone, Serialize)]
pub struct GameState {
    pub id: Uuid,
    pub version: u64,
    pub generation_params: GenerationParams,
    pub board: Arc<Board>,
    pub biomes: BTreeMap<BiomeId, Biome>,
    pub animals: BTreeMap<AnimalId, Animal>,
    pub eggs: BTreeMap<EggId, Egg>,
    #[serde(serialize_with = "serialize_values")]
    pub resources: BTreeMap<Coordinate, Resource>,
    pub players: Vec<Player>,
    pub turn: u32,
    pub sequencer: TurnState,
    pub events: EventSlots,
    pub fog_of_war: bool,
    /// Monotonic event clock used for event timestamps.
    pub clock: u64,
    pub next_animal_id: u32,
    pub next_egg_id: u32,
    pub next_resource_id: u32,
    #[serde(skip)]
    pub rng: ChaCha8Rng,
}

fn serialize_values<S, K, V>(map: &BTreeMap<K, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_seq(map.values())
}

impl GameState {
    /// Wrap freshly generated entities. Resources are empty until the
    /// economy seeds them.
    pub fn from_generated(world: GeneratedWorld, fog_of_war: bool) -> Self {
        let id = Uuid::from_u64_pair(world.params.seed, world.params.seed.rotate_left(32));
        let next_animal_id = world.animals.iter().map(|a| a.id.0 + 1).max().unwrap_or(0);
        let first = world.players.iter().find(|p| p.is_active).map(|p| p.id);
        GameState {
            id,
            version: 0,
            generation_params: world.params,
            board: Arc::new(world.board),
            biomes: world.biomes.into_iter().map(|b| (b.id, b)).collect(),
            animals: world.animals.into_iter().map(|a| (a.id, a)).collect(),
            eggs: BTreeMap::new(),
            resources: BTreeMap::new(),
            players: world.players,
            turn: 1,
            sequencer: TurnState::new(first.map_or(TurnPhase::StartNewRound, TurnPhase::AwaitingPlayerAction)),
            events: EventSlots::default(),
            fog_of_war,
            clock: 0,
            next_animal_id,
            next_egg_id: 0,
            next_resource_id: 0,
            rng: world.rng,
        }
    }

    /// Player whose action the sequencer is waiting on, if any.
    pub fn current_player(&self) -> Option<PlayerId> {
        match self.sequencer.phase {
            TurnPhase::AwaitingPlayerAction(p) => Some(p),
            _ => None,
        }
    }

    pub fn player(&self, id: PlayerId) -> SimResult<&Player> {
        self.players
            .iter()
            .find(|p| p.id == id)
            .ok_or(SimError::UnknownPlayer(id))
    }

    pub fn biome(&self, id: BiomeId) -> SimResult<&Biome> {
        self.biomes.get(&id).ok_or(SimError::UnknownBiome(id))
    }

    pub fn animal(&self, id: AnimalId) -> SimResult<&Animal> {
        self.animals.get(&id).ok_or(SimError::UnknownAnimal(id))
    }

    pub fn egg(&self, id: EggId) -> SimResult<&Egg> {
        self.eggs.get(&id).ok_or(SimError::UnknownEgg(id))
    }

    pub fn animal_at(&self, c: Coordinate) -> Option<&Animal> {
        self.animals.values().find(|a| a.position == c)
    }

    pub fn egg_at(&self, c: Coordinate) -> Option<&Egg> {
        self.eggs.values().find(|e| e.position == c)
    }

    /// Advance the event clock and return the new timestamp.
    pub fn tick_clock(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Replace one player record.
    pub fn replace_player(&mut self, player: Player) -> SimResult<()> {
        let slot = self
            .players
            .iter_mut()
            .find(|p| p.id == player.id)
            .ok_or(SimError::UnknownPlayer(player.id))?;
        *slot = player;
        Ok(())
    }
}

/// Position → animal lookup for occupancy checks.
pub fn occupancy(animals: &BTreeMap<AnimalId, Animal>) -> HashMap<Coordinate, AnimalId> {
    animals.values().map(|a| (a.position, a.id)).collect()
}
