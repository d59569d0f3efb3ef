use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::config::simulation::{EconomyConfig, SimulationConfig};
use crate::error::{SimError, SimResult, Warning};
use crate::simulation::economy::compute_lushness;
use crate::simulation::events::SpawnEvent;
use crate::simulation::movement::displace;
use crate::simulation::state::GameState;
use crate::world::biome::Biome;
use crate::world::coord::Coordinate;
use crate::world::entities::{Animal, AnimalId, Egg, EggId, PlayerId, Species};

/// Eggs laid by one player's biomes, not yet merged into the store.
#[derive(Debug, Clone, Default)]
pub struct Production {
    pub eggs: Vec<Egg>,
    /// Biomes that produced, with `last_production_turn` stamped.
    pub biomes: Vec<Biome>,
    pub next_egg_id: u32,
    pub warnings: Vec<Warning>,
}

/// Whether `biome` lays eggs on `turn`.
pub fn should_produce(biome: &Biome, turn: u32, eco: &EconomyConfig) -> bool {
    eco.production_interval > 0
        && turn % eco.production_interval == 0
        && biome.last_production_turn < turn
        && biome.total_lushness() >= eco.egg_production_threshold
}

/// Lay eggs in every productive biome `player` owns.
///
/// Candidate tiles are non-habitat biome tiles with no egg and no active
/// resource, ranked by how many active resources surround them (resources
/// inside the player's own biomes weigh more). Ties keep board scan order.
pub fn produce_eggs(state: &GameState, player: PlayerId, config: &SimulationConfig) -> Production {
    let eco = &config.economy;
    let board = &state.board;
    let egg_tiles: HashSet<Coordinate> = state.eggs.values().map(|e| e.position).collect();
    let owned_by_player = |c: Coordinate| {
        board
            .biome_at(c)
            .and_then(|id| state.biomes.get(&id))
            .is_some_and(|b| b.owner_id == Some(player))
    };

    let mut out = Production {
        next_egg_id: state.next_egg_id,
        ..Production::default()
    };

    for biome in state.biomes.values().filter(|b| b.owner_id == Some(player)) {
        if !should_produce(biome, state.turn, eco) {
            continue;
        }

        let mut ranked: Vec<(Coordinate, u32)> = board
            .biome_tiles(biome.id)
            .filter(|t| !t.is_habitat)
            .map(|t| t.coordinate)
            .filter(|c| !egg_tiles.contains(c))
            .filter(|c| !state.resources.get(c).is_some_and(|r| r.is_active()))
            .map(|c| {
                let score = eco
                    .egg_neighborhood
                    .around(c)
                    .filter(|n| state.resources.get(n).is_some_and(|r| r.is_active()))
                    .map(|n| {
                        if owned_by_player(n) {
                            eco.owned_resource_weight
                        } else {
                            eco.other_resource_weight
                        }
                    })
                    .sum::<u32>();
                (c, score)
            })
            .collect();

        if ranked.is_empty() {
            warn!(biome = biome.id.0, player = player.0, "No eligible tiles for egg placement");
            out.warnings.push(Warning::NoEggPlacementTiles { biome: biome.id });
            continue;
        }

        // Stable: equal scores stay in scan order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let count = (biome.production_rate as usize).min(ranked.len());
        for &(position, _) in ranked.iter().take(count) {
            out.eggs.push(Egg {
                id: EggId(out.next_egg_id),
                owner_id: player,
                position,
                biome_id: biome.id,
                created_at_turn: state.turn,
            });
            out.next_egg_id += 1;
        }
        let mut produced = biome.clone();
        produced.last_production_turn = state.turn;
        out.biomes.push(produced);

        debug!(biome = biome.id.0, player = player.0, eggs = count, "Eggs produced");
    }
    out
}

/// Fold a [`Production`] into the state.
pub fn merge_production(state: &mut GameState, production: Production) {
    for egg in production.eggs {
        state.eggs.insert(egg.id, egg);
    }
    for biome in production.biomes {
        state.biomes.insert(biome.id, biome);
    }
    state.next_egg_id = production.next_egg_id;
}

/// Result of [`hatch_egg`].
#[derive(Debug, Clone)]
pub struct Hatched {
    pub state: GameState,
    /// `None` when the hatch was blocked.
    pub animal_id: Option<AnimalId>,
    pub warnings: Vec<Warning>,
}

/// Turn an egg into an animal of the species native to its tile.
///
/// An animal already on the tile is pushed away first; if it cannot be,
/// the egg stays and the outcome carries the warning. The newborn cannot
/// act on the turn it hatches.
pub fn hatch_egg(state: &GameState, egg_id: EggId, config: &SimulationConfig) -> SimResult<Hatched> {
    let egg = state.egg(egg_id)?.clone();
    let terrain = state
        .board
        .terrain_at(egg.position)
        .ok_or(SimError::MissingTile(egg.position))?;

    let mut next = state.clone();
    let stamp = next.tick_clock();
    match displace(
        egg.position,
        &state.board,
        &state.animals,
        config.movement.neighborhood,
        stamp,
        &mut next.rng,
    ) {
        Ok(Some((animals, event))) => {
            next.animals = animals;
            next.events.displacement = Some(event);
        }
        Ok(None) => {}
        Err(warning) => {
            return Ok(Hatched {
                state: state.clone(),
                animal_id: None,
                warnings: vec![warning],
            });
        }
    }

    let id = AnimalId(next.next_animal_id);
    next.next_animal_id += 1;
    let mut animal = Animal::new(id, Species::for_terrain(Some(terrain)), egg.position, Some(egg.owner_id));
    animal.has_moved = true;
    next.animals.insert(id, animal);
    next.eggs.remove(&egg_id);
    next.events.spawn = Some(SpawnEvent {
        unit_id: id,
        timestamp: next.tick_clock(),
    });

    let biome = next.biome(egg.biome_id)?.clone();
    let (base, boost) = compute_lushness(&biome, &next.board, &next.resources, &next.eggs, &config.economy);
    if let Some(b) = next.biomes.get_mut(&egg.biome_id) {
        b.set_lushness(base, boost);
    }

    info!(egg = egg_id.0, animal = id.0, player = egg.owner_id.0, "Egg hatched");
    Ok(Hatched {
        state: next,
        animal_id: Some(id),
        warnings: Vec::new(),
    })
}
