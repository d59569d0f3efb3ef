use std::collections::HashMap;

use serde::Serialize;

use crate::simulation::state::GameState;
use crate::world::entities::{PlayerId, Species};

/// Per-round aggregate metrics for introspection and degenerate state detection.
#[derive(Debug, Clone, Serialize)]
pub struct RoundStatistics {
    pub turn: u32,
    pub owned_biomes: u32,
    pub biomes_by_player: HashMap<PlayerId, u32>,
    pub avg_lushness: f32,
    pub active_resources: u32,
    pub depleted_resources: u32,
    pub eggs: u32,
    pub animals: u32,
    pub species_distribution: HashMap<Species, u32>,
    pub energy_by_player: HashMap<PlayerId, f32>,
    pub diversity_index: f32,
}

/// Compute statistics for the current snapshot.
pub fn compute_statistics(state: &GameState) -> RoundStatistics {
    let mut biomes_by_player: HashMap<PlayerId, u32> = HashMap::new();
    let mut total_lushness = 0.0_f64;
    for biome in state.biomes.values() {
        if let Some(owner) = biome.owner_id {
            *biomes_by_player.entry(owner).or_insert(0) += 1;
        }
        total_lushness += biome.total_lushness() as f64;
    }
    let avg_lushness = if state.biomes.is_empty() {
        0.0
    } else {
        (total_lushness / state.biomes.len() as f64) as f32
    };

    let active_resources = state.resources.values().filter(|r| r.is_active()).count() as u32;

    let mut species: HashMap<Species, u32> = HashMap::new();
    for animal in state.animals.values() {
        *species.entry(animal.species).or_insert(0) += 1;
    }
    let diversity = shannon_diversity(&species, state.animals.len() as u32);

    RoundStatistics {
        turn: state.turn,
        owned_biomes: biomes_by_player.values().sum(),
        biomes_by_player,
        avg_lushness,
        active_resources,
        depleted_resources: state.resources.len() as u32 - active_resources,
        eggs: state.eggs.len() as u32,
        animals: state.animals.len() as u32,
        species_distribution: species,
        energy_by_player: state.players.iter().map(|p| (p.id, p.energy)).collect(),
        diversity_index: diversity,
    }
}

/// Shannon diversity index normalized to [0, 1].
/// 0 = a single species, 1 = every present species equally represented.
fn shannon_diversity(distribution: &HashMap<Species, u32>, total: u32) -> f32 {
    if total == 0 {
        return 0.0;
    }

    let total_f = total as f64;
    let mut entropy = 0.0_f64;
    let mut non_zero_types = 0_u32;

    for &count in distribution.values() {
        if count > 0 {
            non_zero_types += 1;
            let p = count as f64 / total_f;
            entropy -= p * p.ln();
        }
    }

    if non_zero_types <= 1 {
        return 0.0;
    }

    // Normalize by max possible entropy (ln of number of species present)
    let max_entropy = (non_zero_types as f64).ln();
    (entropy / max_entropy) as f32
}
