use std::collections::BTreeMap;

use tracing::info;

use crate::config::simulation::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::simulation::economy::compute_lushness;
use crate::simulation::events::BiomeCaptureEvent;
use crate::simulation::state::GameState;
use crate::simulation::visibility::reveal_biome;
use crate::world::biome::Biome;
use crate::world::entities::{Animal, AnimalId, BiomeId, PlayerId};
use crate::world::tile::Board;

/// The idle animal of `player` standing on the habitat of `biome_id`.
fn captor(
    biome_id: BiomeId,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    player: PlayerId,
) -> Option<AnimalId> {
    animals
        .values()
        .filter(|a| a.owner_id == Some(player) && !a.has_moved)
        .find(|a| {
            board
                .tile(a.position)
                .is_some_and(|t| t.is_habitat && t.biome_id == Some(biome_id))
        })
        .map(|a| a.id)
}

/// Whether `player` can take `biome_id` right now.
pub fn can_capture_biome(
    biome_id: BiomeId,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    biomes: &BTreeMap<BiomeId, Biome>,
    player: PlayerId,
) -> SimResult<bool> {
    let biome = biomes.get(&biome_id).ok_or(SimError::UnknownBiome(biome_id))?;
    if biome.owner_id == Some(player) {
        return Ok(false);
    }
    Ok(captor(biome_id, board, animals, player).is_some())
}

/// Hand `biome_id` to `player`.
///
/// Uses up the capturing animal's action, transfers every egg in the biome
/// and reveals all of its tiles to the new owner.
pub fn capture_biome(
    state: &GameState,
    biome_id: BiomeId,
    player: PlayerId,
    config: &SimulationConfig,
) -> SimResult<GameState> {
    state.player(player)?;
    if !can_capture_biome(biome_id, &state.board, &state.animals, &state.biomes, player)? {
        return Err(SimError::CannotCapture {
            biome: biome_id,
            player,
        });
    }
    let animal_id = captor(biome_id, &state.board, &state.animals, player)
        .ok_or(SimError::CannotCapture {
            biome: biome_id,
            player,
        })?;

    let mut next = state.clone();
    let previous_owner = next.biome(biome_id)?.owner_id;
    if let Some(biome) = next.biomes.get_mut(&biome_id) {
        biome.owner_id = Some(player);
        biome.last_production_turn = state.turn.saturating_sub(1);
    }
    if let Some(animal) = next.animals.get_mut(&animal_id) {
        animal.has_moved = true;
    }
    let mut transferred = 0;
    for egg in next.eggs.values_mut().filter(|e| e.biome_id == biome_id) {
        egg.owner_id = player;
        transferred += 1;
    }

    let revealed = reveal_biome(next.player(player)?, &next.board, biome_id);
    next.replace_player(revealed)?;

    let biome = next.biome(biome_id)?.clone();
    let (base, boost) = compute_lushness(&biome, &next.board, &next.resources, &next.eggs, &config.economy);
    if let Some(b) = next.biomes.get_mut(&biome_id) {
        b.set_lushness(base, boost);
    }
    next.events.capture = Some(BiomeCaptureEvent {
        biome_id,
        timestamp: next.tick_clock(),
    });

    info!(
        biome = biome_id.0,
        player = player.0,
        previous_owner = ?previous_owner.map(|p| p.0),
        eggs = transferred,
        "Biome captured"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::state::fixtures::*;
    use crate::world::coord::Coordinate;
    use crate::world::entities::Species;
    use crate::world::tile::Terrain;

    /// Two 3-wide grass biomes; biome 1 (habitat at (3,0)) owned by player 1.
    fn contested() -> GameState {
        let mut state = striped_state(6, 3, 3, Terrain::Grass);
        state.biomes.get_mut(&BiomeId(1)).unwrap().owner_id = Some(PlayerId(1));
        state.turn = 4;
        state
    }

    #[test]
    fn idle_animal_on_habitat_can_capture() {
        let mut state = contested();
        add_animal(&mut state, Species::Buffalo, Coordinate::new(3, 0), Some(PlayerId(0)));
        assert!(can_capture_biome(BiomeId(1), &state.board, &state.animals, &state.biomes, PlayerId(0)).unwrap());
        assert!(!can_capture_biome(BiomeId(1), &state.board, &state.animals, &state.biomes, PlayerId(1)).unwrap());
        assert!(!can_capture_biome(BiomeId(0), &state.board, &state.animals, &state.biomes, PlayerId(0)).unwrap());
    }

    #[test]
    fn moved_or_off_habitat_animal_cannot_capture() {
        let mut state = contested();
        let a = add_animal(&mut state, Species::Buffalo, Coordinate::new(3, 0), Some(PlayerId(0)));
        state.animals.get_mut(&a).unwrap().has_moved = true;
        add_animal(&mut state, Species::Buffalo, Coordinate::new(4, 1), Some(PlayerId(0)));
        assert!(!can_capture_biome(BiomeId(1), &state.board, &state.animals, &state.biomes, PlayerId(0)).unwrap());
    }

    #[test]
    fn unknown_biome_is_an_invariant_error() {
        let state = contested();
        let err = can_capture_biome(BiomeId(8), &state.board, &state.animals, &state.biomes, PlayerId(0)).unwrap_err();
        assert_eq!(err, SimError::UnknownBiome(BiomeId(8)));
    }

    #[test]
    fn capture_transfers_enemy_eggs_in_place() {
        let mut state = contested();
        let captor = add_animal(&mut state, Species::Buffalo, Coordinate::new(3, 0), Some(PlayerId(0)));
        let e1 = add_egg(&mut state, PlayerId(1), Coordinate::new(4, 1), 3);
        let e2 = add_egg(&mut state, PlayerId(1), Coordinate::new(5, 2), 3);
        let outside = add_egg(&mut state, PlayerId(1), Coordinate::new(1, 1), 3);

        let next = capture_biome(&state, BiomeId(1), PlayerId(0), &SimulationConfig::default()).unwrap();
        for (id, at) in [(e1, Coordinate::new(4, 1)), (e2, Coordinate::new(5, 2))] {
            assert_eq!(next.eggs[&id].owner_id, PlayerId(0));
            assert_eq!(next.eggs[&id].position, at);
        }
        assert_eq!(next.eggs[&outside].owner_id, PlayerId(1));

        let biome = &next.biomes[&BiomeId(1)];
        assert_eq!(biome.owner_id, Some(PlayerId(0)));
        assert_eq!(biome.last_production_turn, 3);
        assert!(next.animals[&captor].has_moved);
        assert_eq!(next.events.capture.map(|e| e.biome_id), Some(BiomeId(1)));
        // Two owned eggs over 8 blank tiles.
        assert!((biome.lushness_boost() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn capture_reveals_whole_biome() {
        let mut state = contested();
        add_animal(&mut state, Species::Buffalo, Coordinate::new(3, 0), Some(PlayerId(0)));
        let next = capture_biome(&state, BiomeId(1), PlayerId(0), &SimulationConfig::default()).unwrap();
        let player = next.player(PlayerId(0)).unwrap();
        for tile in next.board.biome_tiles(BiomeId(1)) {
            assert!(player.explored_tiles.contains(&tile.coordinate));
            assert!(player.visible_tiles.contains(&tile.coordinate));
        }
    }

    #[test]
    fn failed_capture_is_rejected() {
        let state = contested();
        let err = capture_biome(&state, BiomeId(1), PlayerId(0), &SimulationConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SimError::CannotCapture {
                biome: BiomeId(1),
                player: PlayerId(0)
            }
        );
    }
}
