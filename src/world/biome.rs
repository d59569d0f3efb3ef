use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::generation::{GenerationParams, InitialOwnerPolicy};
use crate::world::coord::Coordinate;
use crate::world::entities::{BiomeId, PlayerId};
use crate::world::tile::{Board, Terrain};

const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_034;
const BIOME_SATURATION: f32 = 0.65;
const BIOME_LIGHTNESS: f32 = 0.55;

/// The capturable anchor tile of a biome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habitat {
    pub id: u32,
    pub position: Coordinate,
}

/// A territory partition centred on a habitat seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub id: BiomeId,
    pub owner_id: Option<PlayerId>,
    /// Packed 0xRRGGBB.
    pub color: u32,
    pub terrain: Terrain,
    base_lushness: f32,
    lushness_boost: f32,
    total_lushness: f32,
    pub initial_resource_count: u32,
    pub non_depleted_count: u32,
    pub total_harvested: f32,
    pub production_rate: u32,
    pub last_production_turn: u32,
    pub habitat: Habitat,
}

impl Biome {
    pub fn new(id: BiomeId, habitat: Coordinate, terrain: Terrain, production_rate: u32) -> Self {
        Self {
            id,
            owner_id: None,
            color: biome_color(id.0),
            terrain,
            base_lushness: 0.0,
            lushness_boost: 0.0,
            total_lushness: 0.0,
            initial_resource_count: 0,
            non_depleted_count: 0,
            total_harvested: 0.0,
            production_rate,
            last_production_turn: 0,
            habitat: Habitat {
                id: id.0,
                position: habitat,
            },
        }
    }

    pub fn base_lushness(&self) -> f32 {
        self.base_lushness
    }

    pub fn lushness_boost(&self) -> f32 {
        self.lushness_boost
    }

    pub fn total_lushness(&self) -> f32 {
        self.total_lushness
    }

    /// The only way lushness changes; the total is always derived.
    pub(crate) fn set_lushness(&mut self, base: f32, boost: f32) {
        self.base_lushness = base.max(0.0);
        self.lushness_boost = boost.max(0.0);
        self.total_lushness = self.base_lushness + self.lushness_boost;
    }

    pub fn is_depleted(&self) -> bool {
        self.non_depleted_count == 0
    }
}

/// Board with biome assignments plus the biomes themselves, in seed order.
#[derive(Debug, Clone)]
pub struct Partition {
    pub board: Board,
    pub biomes: Vec<Biome>,
}

/// Place habitat seeds, assign every tile to its nearest seed and build one
/// [`Biome`] per seed.
pub fn partition_board(
    board: &Board,
    params: &GenerationParams,
    production_rate: u32,
    rng: &mut impl Rng,
) -> Partition {
    let seeds = place_habitat_seeds(board, params, rng);
    let mut board = board.clone();
    assign_nearest_seed(&mut board, &seeds);

    let mut biomes: Vec<Biome> = seeds
        .iter()
        .enumerate()
        .map(|(i, &pos)| {
            let terrain = board.terrain_at(pos).unwrap_or(Terrain::Grass);
            Biome::new(BiomeId(i as u32), pos, terrain, production_rate)
        })
        .collect();

    match params.initial_owner_policy {
        InitialOwnerPolicy::FirstBeach => {
            if let Some(biome) = biomes.iter_mut().find(|b| b.terrain == Terrain::Beach) {
                biome.owner_id = Some(PlayerId(0));
            } else {
                warn!("No beach habitat seed; first player starts without a biome");
            }
        }
        InitialOwnerPolicy::None => {}
    }

    debug!(seeds = seeds.len(), "Board partitioned into biomes");
    Partition { board, biomes }
}

/// One seed per terrain type present, then extra seeds until none fits.
pub fn place_habitat_seeds(
    board: &Board,
    params: &GenerationParams,
    rng: &mut impl Rng,
) -> Vec<Coordinate> {
    let mut seeds: Vec<Coordinate> = Vec::new();
    let min = params.min_seed_distance;
    let attempts = params.seed_search_attempts;

    for terrain in Terrain::ALL {
        let candidates: Vec<Coordinate> = board
            .tiles
            .iter()
            .filter(|t| t.terrain == terrain)
            .map(|t| t.coordinate)
            .collect();
        if let Some(c) = sample_seed(&candidates, &seeds, min, attempts, true, rng) {
            seeds.push(c);
        }
    }

    let all: Vec<Coordinate> = board.coordinates().collect();
    for _ in 0..params.extra_seed_iterations {
        match sample_seed(&all, &seeds, min, attempts, false, rng) {
            Some(c) => seeds.push(c),
            None => break,
        }
    }
    seeds
}

/// Randomly sample `candidates`, returning the first one at least `min`
/// (Manhattan) from every existing seed. With `accept_best`, falls back to
/// the sampled candidate farthest from the others.
fn sample_seed(
    candidates: &[Coordinate],
    seeds: &[Coordinate],
    min: u32,
    attempts: u32,
    accept_best: bool,
    rng: &mut impl Rng,
) -> Option<Coordinate> {
    let mut best: Option<(Coordinate, u32)> = None;
    for _ in 0..attempts {
        let &c = candidates.choose(rng)?;
        let nearest = seeds
            .iter()
            .map(|s| s.manhattan(c))
            .min()
            .unwrap_or(u32::MAX);
        if nearest == 0 {
            continue;
        }
        if nearest >= min {
            return Some(c);
        }
        if best.is_none_or(|(_, d)| nearest > d) {
            best = Some((c, nearest));
        }
    }
    if accept_best {
        if let Some((c, d)) = best {
            warn!(x = c.x, y = c.y, distance = d, "Accepting overlapping habitat seed");
        }
        best.map(|(c, _)| c)
    } else {
        None
    }
}

/// Assign every tile to the seed with minimum Manhattan distance. Ties go to
/// the earlier seed. Seed tiles become habitats.
pub fn assign_nearest_seed(board: &mut Board, seeds: &[Coordinate]) {
    if seeds.is_empty() {
        return;
    }
    for tile in board.tiles.iter_mut() {
        let mut nearest = 0usize;
        let mut nearest_d = u32::MAX;
        for (i, s) in seeds.iter().enumerate() {
            let d = s.manhattan(tile.coordinate);
            if d < nearest_d {
                nearest = i;
                nearest_d = d;
            }
        }
        tile.biome_id = Some(BiomeId(nearest as u32));
        tile.is_habitat = nearest_d == 0;
    }
}

/// Visually distinct color for the `index`-th biome: hues stepped by the
/// golden ratio, fixed saturation and lightness.
pub fn biome_color(index: u32) -> u32 {
    let hue = (index as f32 * GOLDEN_RATIO_CONJUGATE).fract();
    hsl_to_rgb(hue, BIOME_SATURATION, BIOME_LIGHTNESS)
}

/// HSL (all components in [0, 1]) to packed 0xRRGGBB.
fn hsl_to_rgb(h: f32, s: f32, l: f32) -> u32 {
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |mut t: f32| -> u32 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v.clamp(0.0, 1.0) * 255.0).round() as u32
    };
    let r = channel(h + 1.0 / 3.0);
    let g = channel(h);
    let b = channel(h - 1.0 / 3.0);
    (r << 16) | (g << 8) | b
}
