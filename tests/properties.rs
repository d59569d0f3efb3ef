//! Property-based tests for board generation and the simulation rules.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;

use ecoterra::config::generation::GenerationParams;
use ecoterra::config::simulation::SimulationConfig;
use ecoterra::simulation::agent::{PassAgent, PlayerAgent};
use ecoterra::simulation::visibility::compute_visibility;
use ecoterra::simulation::{GameState, Simulation};
use ecoterra::world::coord::Coordinate;
use ecoterra::world::entities::PlayerId;
use ecoterra::world::generation::generate_world;

fn params(seed: u64, width: u32, height: u32) -> GenerationParams {
    GenerationParams {
        seed,
        width,
        height,
        ..GenerationParams::default()
    }
}

fn assert_no_stacking(state: &GameState) -> Result<(), TestCaseError> {
    let mut seen = HashSet::new();
    for animal in state.animals.values() {
        prop_assert!(seen.insert(animal.position), "two animals on {}", animal.position);
    }
    Ok(())
}

fn assert_economy_bounds(state: &GameState) -> Result<(), TestCaseError> {
    for r in state.resources.values() {
        prop_assert!((0.0..=10.0).contains(&r.value()), "resource value {}", r.value());
        prop_assert_eq!(r.is_active(), r.value() > 0.0);
    }
    for b in state.biomes.values() {
        let active = state
            .resources
            .values()
            .filter(|r| r.biome_id == Some(b.id) && r.is_active())
            .count() as u32;
        prop_assert_eq!(b.non_depleted_count, active, "biome {} non-depleted count", b.id.0);
        prop_assert!(b.total_lushness() >= 0.0);
        prop_assert!((b.total_lushness() - (b.base_lushness() + b.lushness_boost())).abs() < 1e-5);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Every tile ends up in exactly one biome.
    #[test]
    fn prop_partition_covers_board(seed in 1u64..u64::MAX, width in 6u32..28, height in 6u32..28) {
        let world = generate_world(&params(seed, width, height), 2);
        prop_assert_eq!(world.board.tiles.len(), (width * height) as usize);
        for tile in &world.board.tiles {
            let id = tile.biome_id;
            prop_assert!(id.is_some(), "tile {} has no biome", tile.coordinate);
            prop_assert!(world.biomes.iter().any(|b| Some(b.id) == id));
        }
    }

    /// Harvesting and regrowth keep resources and lushness in range.
    #[test]
    fn prop_economy_stays_bounded(
        seed in 1u64..u64::MAX,
        harvests in prop::collection::vec((0i32..16, 0i32..16, 0.0f32..20.0), 0..12),
        rounds in 1u32..4,
    ) {
        let mut sim = Simulation::generate(&params(seed, 16, 16), SimulationConfig::default()).unwrap();
        let mut agents: Vec<Box<dyn PlayerAgent>> = vec![Box::new(PassAgent), Box::new(PassAgent)];
        for (x, y, amount) in harvests {
            let player = sim.snapshot().current_player().unwrap();
            sim.harvest(player, Coordinate::new(x, y), amount).unwrap();
            assert_economy_bounds(&sim.snapshot())?;
        }
        for _ in 0..rounds {
            sim.run_round(&mut agents).unwrap();
            assert_economy_bounds(&sim.snapshot())?;
        }
    }

    /// Recomputing visibility on unchanged inputs changes nothing.
    #[test]
    fn prop_visibility_idempotent(seed in 1u64..u64::MAX, fog in any::<bool>()) {
        let sim = Simulation::generate(&params(seed, 14, 14), SimulationConfig::default()).unwrap();
        let s = sim.snapshot();
        let once = compute_visibility(&s.players, &s.board, &s.animals, &s.biomes, fog);
        let twice = compute_visibility(&once, &s.board, &s.animals, &s.biomes, fog);
        prop_assert_eq!(once, twice);
    }

    /// Moves outside the computed range are rejected without touching the
    /// snapshot; moves inside it never stack two animals.
    #[test]
    fn prop_move_legality(
        seed in 1u64..u64::MAX,
        targets in prop::collection::vec((0i32..14, 0i32..14), 1..10),
    ) {
        let mut sim = Simulation::generate(&params(seed, 14, 14), SimulationConfig::default()).unwrap();
        let player = PlayerId(0);
        let mine: Vec<_> = sim
            .snapshot()
            .animals
            .values()
            .filter(|a| a.owner_id == Some(player))
            .map(|a| a.id)
            .collect();
        prop_assume!(!mine.is_empty());

        for (i, (x, y)) in targets.into_iter().enumerate() {
            let animal = mine[i % mine.len()];
            let dest = Coordinate::new(x, y);
            let range = sim.valid_moves(animal).unwrap();
            let before = sim.snapshot();
            let occupant = before.animal_at(dest).map(|a| a.id);
            let result = sim.move_animal(player, animal, dest);
            if range.contains(&dest) {
                let report = result.unwrap();
                if report.warnings.is_empty() && occupant.is_some_and(|o| o != animal) {
                    prop_assert!(report.snapshot.events.displacement.is_some());
                }
                assert_no_stacking(&report.snapshot)?;
            } else {
                prop_assert!(result.is_err());
                prop_assert!(Arc::ptr_eq(&before, &sim.snapshot()));
            }
        }
    }
}
