use std::collections::{BTreeMap, HashMap};

use rand::prelude::*;
use tracing::{debug, warn};

use crate::config::simulation::EconomyConfig;
use crate::error::{SimError, SimResult, Warning};
use crate::world::biome::Biome;
use crate::world::coord::Coordinate;
use crate::world::entities::{BiomeId, Egg, EggId, Player, PlayerId, Resource, ResourceId, ResourceKind};
use crate::world::tile::Board;

/// Per-turn regeneration for a biome of the given lushness.
///
/// `max(0, a·l³ + b·l² + c·l + d)`
pub fn regeneration_rate(lushness: f32, eco: &EconomyConfig) -> f32 {
    let l = lushness;
    (eco.regen_a * l * l * l + eco.regen_b * l * l + eco.regen_c * l + eco.regen_d).max(0.0)
}

/// Resources and biome counters after [`regenerate`].
#[derive(Debug, Clone)]
pub struct Regrowth {
    pub resources: BTreeMap<Coordinate, Resource>,
    pub biomes: BTreeMap<BiomeId, Biome>,
    /// Resources that went from depleted back to active.
    pub revived: u32,
}

/// Regrow every resource of an owned, non-depleted biome.
///
/// With `owner` set only that player's biomes regrow. Growth slows as a
/// resource approaches `max_resource_value` and never overshoots it. A
/// depleted resource that regrows counts towards its biome's
/// `non_depleted_count` again.
pub fn regenerate(
    resources: &BTreeMap<Coordinate, Resource>,
    biomes: &BTreeMap<BiomeId, Biome>,
    owner: Option<PlayerId>,
    eco: &EconomyConfig,
) -> Regrowth {
    let rates: HashMap<BiomeId, f32> = biomes
        .values()
        .filter(|b| match (b.owner_id, owner) {
            (None, _) => false,
            (Some(o), Some(filter)) => o == filter,
            (Some(_), None) => true,
        })
        .filter(|b| !b.is_depleted())
        .map(|b| (b.id, regeneration_rate(b.total_lushness(), eco)))
        .collect();

    let max = eco.max_resource_value;
    let mut next = resources.clone();
    let mut next_biomes = biomes.clone();
    let mut revived = 0;
    for resource in next.values_mut() {
        let Some(biome_id) = resource.biome_id else {
            continue;
        };
        let Some(&rate) = rates.get(&biome_id) else {
            continue;
        };
        if rate <= 0.0 {
            continue;
        }
        let was_active = resource.is_active();
        let v = resource.value();
        resource.set_value((v + rate * (1.0 - v / max)).min(max));
        if !was_active && resource.is_active() {
            if let Some(b) = next_biomes.get_mut(&biome_id) {
                b.non_depleted_count += 1;
            }
            revived += 1;
        }
    }
    debug!(biomes = rates.len(), revived, "Resources regenerated");
    Regrowth {
        resources: next,
        biomes: next_biomes,
        revived,
    }
}

/// Fresh resource layout produced by [`reset_resources`].
#[derive(Debug, Clone)]
pub struct ResourceReset {
    pub biomes: BTreeMap<BiomeId, Biome>,
    pub resources: BTreeMap<Coordinate, Resource>,
    pub next_resource_id: u32,
    pub warnings: Vec<Warning>,
}

/// Scatter full-value resources over `density` of each biome's eligible tiles.
///
/// Eligible tiles are non-habitat tiles whose terrain carries a resource
/// kind (everything except beach). Biome counters restart from the new
/// layout.
pub fn reset_resources(
    board: &Board,
    biomes: &BTreeMap<BiomeId, Biome>,
    density: f32,
    eco: &EconomyConfig,
    rng: &mut impl Rng,
) -> SimResult<ResourceReset> {
    if !(0.0..=1.0).contains(&density) {
        return Err(SimError::InvalidAmount(density));
    }
    let mut warnings = Vec::new();
    if board.is_empty() {
        warn!("Resource reset on an empty board");
        warnings.push(Warning::EmptyBoard);
    }

    let mut next_biomes = biomes.clone();
    let mut resources = BTreeMap::new();
    let mut next_id = 0u32;

    for biome in next_biomes.values_mut() {
        let eligible: Vec<(Coordinate, ResourceKind)> = board
            .biome_tiles(biome.id)
            .filter(|t| !t.is_habitat)
            .filter_map(|t| ResourceKind::for_terrain(t.terrain).map(|k| (t.coordinate, k)))
            .collect();
        let count = (eligible.len() as f32 * density).round() as usize;
        for &(at, kind) in eligible.choose_multiple(rng, count) {
            let resource = Resource::new(
                ResourceId(next_id),
                kind,
                at,
                Some(biome.id),
                eco.max_resource_value,
            );
            next_id += 1;
            resources.insert(at, resource);
        }
        biome.initial_resource_count = count as u32;
        biome.non_depleted_count = count as u32;
        biome.total_harvested = 0.0;
    }

    debug!(resources = resources.len(), density, "Resources reset");
    Ok(ResourceReset {
        biomes: next_biomes,
        resources,
        next_resource_id: next_id,
        warnings,
    })
}

#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub resources: BTreeMap<Coordinate, Resource>,
    pub biomes: BTreeMap<BiomeId, Biome>,
    pub player: Player,
    /// Amount actually taken; 0 when there was nothing to harvest.
    pub harvested: f32,
}

/// Take up to `amount` from the active resource at `at`.
///
/// A tile without an active resource yields an unchanged outcome. The
/// caller recomputes lushness afterwards.
pub fn harvest(
    at: Coordinate,
    amount: f32,
    resources: &BTreeMap<Coordinate, Resource>,
    biomes: &BTreeMap<BiomeId, Biome>,
    player: &Player,
) -> SimResult<HarvestOutcome> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(SimError::InvalidAmount(amount));
    }
    let unchanged = || HarvestOutcome {
        resources: resources.clone(),
        biomes: biomes.clone(),
        player: player.clone(),
        harvested: 0.0,
    };
    let Some(resource) = resources.get(&at).filter(|r| r.is_active()) else {
        return Ok(unchanged());
    };
    let biome_id = resource
        .biome_id
        .ok_or_else(|| SimError::Invariant(format!("resource at {at} has no biome")))?;
    if !biomes.contains_key(&biome_id) {
        return Err(SimError::UnknownBiome(biome_id));
    }

    let taken = amount.min(resource.value());
    let mut next_resources = resources.clone();
    let mut next_biomes = biomes.clone();
    let mut next_player = player.clone();

    if let Some(r) = next_resources.get_mut(&at) {
        r.set_value(r.value() - taken);
        if let Some(b) = next_biomes.get_mut(&biome_id) {
            if !r.is_active() {
                b.non_depleted_count = b.non_depleted_count.saturating_sub(1);
            }
            b.total_harvested += taken;
        }
    }
    next_player.energy += taken;

    debug!(player = player.id.0, x = at.x, y = at.y, taken, "Harvested");
    Ok(HarvestOutcome {
        resources: next_resources,
        biomes: next_biomes,
        player: next_player,
        harvested: taken,
    })
}

/// Inputs of the lushness formula gathered for one biome.
#[derive(Debug, Clone, Copy, Default)]
struct LushnessInputs {
    active_value: f32,
    blank_tiles: u32,
    owned_eggs: u32,
}

/// `(base, boost)` lushness of `biome`.
pub fn compute_lushness(
    biome: &Biome,
    board: &Board,
    resources: &BTreeMap<Coordinate, Resource>,
    eggs: &BTreeMap<EggId, Egg>,
    eco: &EconomyConfig,
) -> (f32, f32) {
    let mut inputs = LushnessInputs::default();
    for tile in board.biome_tiles(biome.id) {
        match resources.get(&tile.coordinate).filter(|r| r.is_active()) {
            Some(r) => inputs.active_value += r.value(),
            None if !tile.is_habitat => inputs.blank_tiles += 1,
            None => {}
        }
    }
    inputs.owned_eggs = eggs
        .values()
        .filter(|e| e.biome_id == biome.id && Some(e.owner_id) == biome.owner_id)
        .count() as u32;
    lushness_from(biome, inputs, eco)
}

fn lushness_from(biome: &Biome, inputs: LushnessInputs, eco: &EconomyConfig) -> (f32, f32) {
    let base = if biome.initial_resource_count == 0 {
        0.0
    } else {
        inputs.active_value / (biome.initial_resource_count as f32 * eco.max_resource_value)
            * eco.max_lushness
    };
    let egg_pct = if inputs.blank_tiles == 0 {
        0.0
    } else {
        inputs.owned_eggs as f32 / inputs.blank_tiles as f32
    };
    let boost = (egg_pct * 2.0).min(eco.max_lushness_boost);
    (base, boost)
}

/// Recompute lushness for every biome in one pass over the board.
pub fn recalculate_lushness(
    biomes: &BTreeMap<BiomeId, Biome>,
    board: &Board,
    resources: &BTreeMap<Coordinate, Resource>,
    eggs: &BTreeMap<EggId, Egg>,
    eco: &EconomyConfig,
) -> BTreeMap<BiomeId, Biome> {
    let mut inputs: HashMap<BiomeId, LushnessInputs> = HashMap::new();
    for tile in &board.tiles {
        let Some(id) = tile.biome_id else { continue };
        let entry = inputs.entry(id).or_default();
        match resources.get(&tile.coordinate).filter(|r| r.is_active()) {
            Some(r) => entry.active_value += r.value(),
            None if !tile.is_habitat => entry.blank_tiles += 1,
            None => {}
        }
    }
    for egg in eggs.values() {
        let owned = biomes
            .get(&egg.biome_id)
            .is_some_and(|b| b.owner_id == Some(egg.owner_id));
        if owned {
            inputs.entry(egg.biome_id).or_default().owned_eggs += 1;
        }
    }

    let mut next = biomes.clone();
    for biome in next.values_mut() {
        let (base, boost) = lushness_from(
            biome,
            inputs.get(&biome.id).copied().unwrap_or_default(),
            eco,
        );
        biome.set_lushness(base, boost);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::state::fixtures::*;
    use crate::world::tile::Terrain;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn eco() -> EconomyConfig {
        EconomyConfig::default()
    }

    #[test]
    fn regeneration_rate_follows_polynomial() {
        let e = eco();
        assert!((regeneration_rate(0.0, &e) - 0.1).abs() < 1e-6);
        let l = 4.0_f32;
        let expected = -0.0015 * 64.0 + 0.043 * 16.0 + 0.04 * 4.0 + 0.1;
        assert!((regeneration_rate(l, &e) - expected).abs() < 1e-5);
    }

    #[test]
    fn regeneration_rate_is_never_negative() {
        let e = EconomyConfig {
            regen_d: -5.0,
            ..eco()
        };
        assert_eq!(regeneration_rate(0.0, &e), 0.0);
    }

    #[test]
    fn regenerate_only_touches_owned_biomes() {
        let mut state = striped_state(6, 2, 3, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 5.0);
        add_resource(&mut state, Coordinate::new(4, 1), 5.0);
        for b in state.biomes.values_mut() {
            b.initial_resource_count = 1;
            b.non_depleted_count = 1;
        }
        state.biomes.get_mut(&BiomeId(0)).unwrap().owner_id = Some(PlayerId(0));

        let next = regenerate(&state.resources, &state.biomes, None, &eco()).resources;
        let owned = next[&Coordinate::new(1, 1)].value();
        assert!(owned > 5.0 && owned <= 10.0);
        assert_eq!(next[&Coordinate::new(4, 1)].value(), 5.0);
        // Input left untouched.
        assert_eq!(state.resources[&Coordinate::new(1, 1)].value(), 5.0);
    }

    #[test]
    fn regenerate_respects_owner_filter() {
        let mut state = striped_state(6, 2, 3, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 5.0);
        let biome = state.biomes.get_mut(&BiomeId(0)).unwrap();
        biome.owner_id = Some(PlayerId(1));
        biome.non_depleted_count = 1;

        let next = regenerate(&state.resources, &state.biomes, Some(PlayerId(0)), &eco()).resources;
        assert_eq!(next[&Coordinate::new(1, 1)].value(), 5.0);
        let next = regenerate(&state.resources, &state.biomes, Some(PlayerId(1)), &eco()).resources;
        assert!(next[&Coordinate::new(1, 1)].value() > 5.0);
    }

    #[test]
    fn regeneration_saturates_at_max() {
        let mut state = striped_state(3, 2, 3, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 9.99);
        let biome = state.biomes.get_mut(&BiomeId(0)).unwrap();
        biome.owner_id = Some(PlayerId(0));
        biome.non_depleted_count = 1;
        biome.set_lushness(8.0, 2.0);
        let mut resources = state.resources.clone();
        for _ in 0..50 {
            resources = regenerate(&resources, &state.biomes, None, &eco()).resources;
        }
        let v = resources[&Coordinate::new(1, 1)].value();
        assert!(v <= 10.0 && v > 9.99);
    }

    #[test]
    fn reset_places_rounded_share_of_eligible_tiles() {
        let mut state = striped_state(5, 4, 5, Terrain::Grass);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // 20 tiles, 1 habitat: 19 eligible, 0.5 → round(9.5) = 10.
        let reset = reset_resources(&state.board, &state.biomes, 0.5, &eco(), &mut rng).unwrap();
        assert_eq!(reset.resources.len(), 10);
        let biome = &reset.biomes[&BiomeId(0)];
        assert_eq!(biome.initial_resource_count, 10);
        assert_eq!(biome.non_depleted_count, 10);
        assert_eq!(biome.total_harvested, 0.0);
        for r in reset.resources.values() {
            assert_eq!(r.value(), 10.0);
            assert!(r.is_active());
            assert!(!state.board.tile(r.position).unwrap().is_habitat);
        }
        state.resources = reset.resources;
        assert_eq!(reset.next_resource_id, 10);
    }

    #[test]
    fn reset_never_uses_beaches() {
        let state = striped_state(4, 4, 4, Terrain::Beach);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let reset = reset_resources(&state.board, &state.biomes, 1.0, &eco(), &mut rng).unwrap();
        assert!(reset.resources.is_empty());
        assert_eq!(reset.biomes[&BiomeId(0)].initial_resource_count, 0);
    }

    #[test]
    fn reset_rejects_out_of_range_density() {
        let state = striped_state(4, 4, 4, Terrain::Grass);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = reset_resources(&state.board, &state.biomes, 1.5, &eco(), &mut rng).unwrap_err();
        assert_eq!(err, SimError::InvalidAmount(1.5));
    }

    #[test]
    fn overharvest_takes_only_what_is_there() {
        let mut state = striped_state(4, 4, 4, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(2, 2), 10.0);
        let biome = state.biomes.get_mut(&BiomeId(0)).unwrap();
        biome.initial_resource_count = 1;
        biome.non_depleted_count = 1;
        let player = state.players[0].clone();

        let out = harvest(Coordinate::new(2, 2), 15.0, &state.resources, &state.biomes, &player).unwrap();
        let r = &out.resources[&Coordinate::new(2, 2)];
        assert_eq!(r.value(), 0.0);
        assert!(!r.is_active());
        assert_eq!(out.biomes[&BiomeId(0)].non_depleted_count, 0);
        assert_eq!(out.biomes[&BiomeId(0)].total_harvested, 10.0);
        assert_eq!(out.player.energy, 10.0);
        assert_eq!(out.harvested, 10.0);
    }

    fn active_in(resources: &BTreeMap<Coordinate, Resource>, id: BiomeId) -> u32 {
        resources
            .values()
            .filter(|r| r.biome_id == Some(id) && r.is_active())
            .count() as u32
    }

    #[test]
    fn regrown_resource_counts_as_non_depleted_again() {
        let mut state = striped_state(4, 4, 4, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 10.0);
        add_resource(&mut state, Coordinate::new(2, 2), 5.0);
        let biome = state.biomes.get_mut(&BiomeId(0)).unwrap();
        biome.owner_id = Some(PlayerId(0));
        biome.initial_resource_count = 2;
        biome.non_depleted_count = 2;
        let player = state.players[0].clone();
        let depleted = Coordinate::new(1, 1);

        let out = harvest(depleted, 10.0, &state.resources, &state.biomes, &player).unwrap();
        assert_eq!(out.biomes[&BiomeId(0)].non_depleted_count, active_in(&out.resources, BiomeId(0)));

        let grown = regenerate(&out.resources, &out.biomes, Some(PlayerId(0)), &eco());
        assert!(grown.resources[&depleted].is_active());
        assert_eq!(grown.revived, 1);
        assert_eq!(grown.biomes[&BiomeId(0)].non_depleted_count, 2);

        let again = harvest(depleted, 10.0, &grown.resources, &grown.biomes, &out.player).unwrap();
        let biome = &again.biomes[&BiomeId(0)];
        assert_eq!(biome.non_depleted_count, active_in(&again.resources, BiomeId(0)));
        assert_eq!(biome.non_depleted_count, 1);
        assert!(!biome.is_depleted());

        // The untouched resource keeps regrowing.
        let before = again.resources[&Coordinate::new(2, 2)].value();
        let grown = regenerate(&again.resources, &again.biomes, Some(PlayerId(0)), &eco());
        assert!(grown.resources[&Coordinate::new(2, 2)].value() > before);
    }

    #[test]
    fn partial_harvest_keeps_resource_active() {
        let mut state = striped_state(4, 4, 4, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(2, 2), 10.0);
        state.biomes.get_mut(&BiomeId(0)).unwrap().non_depleted_count = 1;
        let player = state.players[0].clone();

        let out = harvest(Coordinate::new(2, 2), 4.0, &state.resources, &state.biomes, &player).unwrap();
        assert_eq!(out.resources[&Coordinate::new(2, 2)].value(), 6.0);
        assert_eq!(out.biomes[&BiomeId(0)].non_depleted_count, 1);
        assert_eq!(out.player.energy, 4.0);
    }

    #[test]
    fn harvesting_blank_tile_is_noop() {
        let state = striped_state(4, 4, 4, Terrain::Grass);
        let player = state.players[0].clone();
        let out = harvest(Coordinate::new(1, 1), 5.0, &state.resources, &state.biomes, &player).unwrap();
        assert_eq!(out.harvested, 0.0);
        assert_eq!(out.player, player);
        assert_eq!(out.biomes, state.biomes);
    }

    #[test]
    fn harvest_rejects_negative_amount() {
        let state = striped_state(4, 4, 4, Terrain::Grass);
        let player = state.players[0].clone();
        let err = harvest(Coordinate::new(1, 1), -1.0, &state.resources, &state.biomes, &player).unwrap_err();
        assert_eq!(err, SimError::InvalidAmount(-1.0));
    }

    #[test]
    fn lushness_scales_with_remaining_value() {
        let mut state = striped_state(4, 4, 4, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 10.0);
        add_resource(&mut state, Coordinate::new(2, 1), 5.0);
        state.biomes.get_mut(&BiomeId(0)).unwrap().initial_resource_count = 2;

        let biome = &state.biomes[&BiomeId(0)];
        let (base, boost) = compute_lushness(biome, &state.board, &state.resources, &state.eggs, &eco());
        assert!((base - 15.0 / 20.0 * 8.0).abs() < 1e-5);
        assert_eq!(boost, 0.0);
    }

    #[test]
    fn owned_eggs_boost_lushness() {
        let mut state = striped_state(3, 2, 3, Terrain::Grass);
        // 6 tiles, 1 habitat, 5 blank. Two owned eggs: 2/5 * 2 = 0.8.
        state.biomes.get_mut(&BiomeId(0)).unwrap().owner_id = Some(PlayerId(0));
        add_egg(&mut state, PlayerId(0), Coordinate::new(1, 1), 2);
        add_egg(&mut state, PlayerId(0), Coordinate::new(2, 1), 2);
        add_egg(&mut state, PlayerId(1), Coordinate::new(2, 0), 2);

        let next = recalculate_lushness(&state.biomes, &state.board, &state.resources, &state.eggs, &eco());
        let b = &next[&BiomeId(0)];
        assert!((b.lushness_boost() - 0.8).abs() < 1e-5);
        assert_eq!(b.base_lushness(), 0.0);
        assert_eq!(b.total_lushness(), b.base_lushness() + b.lushness_boost());
    }

    #[test]
    fn lushness_boost_is_capped() {
        let mut state = striped_state(3, 1, 3, Terrain::Grass);
        state.biomes.get_mut(&BiomeId(0)).unwrap().owner_id = Some(PlayerId(0));
        add_egg(&mut state, PlayerId(0), Coordinate::new(1, 0), 2);
        add_egg(&mut state, PlayerId(0), Coordinate::new(2, 0), 2);
        let next = recalculate_lushness(&state.biomes, &state.board, &state.resources, &state.eggs, &eco());
        assert_eq!(next[&BiomeId(0)].lushness_boost(), 2.0);
    }

    #[test]
    fn bulk_and_single_lushness_agree() {
        let mut state = striped_state(6, 3, 3, Terrain::Grass);
        add_resource(&mut state, Coordinate::new(1, 1), 7.0);
        add_resource(&mut state, Coordinate::new(4, 2), 3.0);
        for b in state.biomes.values_mut() {
            b.initial_resource_count = 2;
            b.owner_id = Some(PlayerId(0));
        }
        add_egg(&mut state, PlayerId(0), Coordinate::new(2, 2), 2);

        let bulk = recalculate_lushness(&state.biomes, &state.board, &state.resources, &state.eggs, &eco());
        for biome in state.biomes.values() {
            let (base, boost) = compute_lushness(biome, &state.board, &state.resources, &state.eggs, &eco());
            assert!((bulk[&biome.id].base_lushness() - base).abs() < 1e-6);
            assert!((bulk[&biome.id].lushness_boost() - boost).abs() < 1e-6);
        }
    }
}
