use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;

use crate::world::biome::Biome;
use crate::world::coord::{Coordinate, Neighborhood};
use crate::world::entities::{Animal, AnimalId, BiomeId, Player, PlayerId};
use crate::world::tile::Board;

/// Tiles `player` currently sees with fog of war on: the 3×3 block around
/// each of their animals plus every tile of every biome they own.
pub fn sight_of(
    player: PlayerId,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    biomes: &BTreeMap<BiomeId, Biome>,
) -> BTreeSet<Coordinate> {
    let mut seen = BTreeSet::new();
    for animal in animals.values().filter(|a| a.owner_id == Some(player)) {
        seen.insert(animal.position);
        seen.extend(
            Neighborhood::Eight
                .around(animal.position)
                .filter(|&c| board.in_bounds(c)),
        );
    }
    for biome in biomes.values().filter(|b| b.owner_id == Some(player)) {
        seen.extend(board.biome_tiles(biome.id).map(|t| t.coordinate));
    }
    seen
}

/// Recompute every player's visible set. Explored sets only ever grow and
/// are left alone while fog is off.
pub fn compute_visibility(
    players: &[Player],
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    biomes: &BTreeMap<BiomeId, Biome>,
    fog_enabled: bool,
) -> Vec<Player> {
    players
        .par_iter()
        .map(|player| {
            let mut next = player.clone();
            if fog_enabled {
                next.visible_tiles = sight_of(player.id, board, animals, biomes);
                next.explored_tiles.extend(next.visible_tiles.iter().copied());
            } else {
                next.visible_tiles = board.coordinates().collect();
            }
            next
        })
        .collect()
}

/// Mark every tile of `biome_id` explored and visible for `player`.
pub fn reveal_biome(player: &Player, board: &Board, biome_id: BiomeId) -> Player {
    let mut next = player.clone();
    for tile in board.biome_tiles(biome_id) {
        next.visible_tiles.insert(tile.coordinate);
        next.explored_tiles.insert(tile.coordinate);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::state::fixtures::*;
    use crate::world::entities::Species;
    use crate::world::tile::Terrain;

    #[test]
    fn animals_see_their_surroundings() {
        let mut state = striped_state(10, 10, 10, Terrain::Grass);
        add_animal(&mut state, Species::Buffalo, Coordinate::new(5, 5), Some(PlayerId(0)));
        add_animal(&mut state, Species::Buffalo, Coordinate::new(0, 0), Some(PlayerId(0)));
        let players = compute_visibility(&state.players, &state.board, &state.animals, &state.biomes, true);
        let p0 = &players[0];
        // 9 around the centre animal, 4 in the clipped corner.
        assert_eq!(p0.visible_tiles.len(), 13);
        assert_eq!(p0.explored_tiles, p0.visible_tiles);
        assert!(players[1].visible_tiles.is_empty());
    }

    #[test]
    fn owned_biomes_are_visible() {
        let mut state = striped_state(6, 3, 3, Terrain::Grass);
        state.biomes.get_mut(&BiomeId(1)).unwrap().owner_id = Some(PlayerId(1));
        let players = compute_visibility(&state.players, &state.board, &state.animals, &state.biomes, true);
        assert_eq!(players[1].visible_tiles.len(), 9);
        assert!(players[1].visible_tiles.iter().all(|c| c.x >= 3));
    }

    #[test]
    fn visibility_is_idempotent() {
        let mut state = striped_state(8, 8, 4, Terrain::Grass);
        add_animal(&mut state, Species::Buffalo, Coordinate::new(2, 3), Some(PlayerId(1)));
        state.biomes.get_mut(&BiomeId(0)).unwrap().owner_id = Some(PlayerId(0));
        let once = compute_visibility(&state.players, &state.board, &state.animals, &state.biomes, true);
        let twice = compute_visibility(&once, &state.board, &state.animals, &state.biomes, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn fog_toggle_keeps_exploration() {
        let mut state = striped_state(10, 10, 10, Terrain::Grass);
        let a = add_animal(&mut state, Species::Buffalo, Coordinate::new(2, 2), Some(PlayerId(0)));
        let players = compute_visibility(&state.players, &state.board, &state.animals, &state.biomes, true);
        let explored_before = players[0].explored_tiles.clone();

        state.animals.get_mut(&a).unwrap().position = Coordinate::new(7, 7);
        let off = compute_visibility(&players, &state.board, &state.animals, &state.biomes, false);
        assert_eq!(off[0].visible_tiles.len(), 100);
        assert_eq!(off[0].explored_tiles, explored_before);

        let on = compute_visibility(&off, &state.board, &state.animals, &state.biomes, true);
        let current = sight_of(PlayerId(0), &state.board, &state.animals, &state.biomes);
        let expected: BTreeSet<Coordinate> = explored_before.union(&current).copied().collect();
        assert_eq!(on[0].explored_tiles, expected);
        assert_eq!(on[0].visible_tiles, current);
        assert!(on[0].explored_tiles.is_superset(&explored_before));
    }

    #[test]
    fn reveal_marks_biome_explored() {
        let state = striped_state(6, 2, 3, Terrain::Grass);
        let player = reveal_biome(&state.players[0], &state.board, BiomeId(0));
        assert_eq!(player.explored_tiles.len(), 6);
        assert!(player.explored_tiles.iter().all(|c| c.x < 3));
    }
}
