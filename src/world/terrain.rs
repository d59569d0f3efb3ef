use std::collections::VecDeque;

use noise::{NoiseFn, Perlin};

use crate::config::generation::GenerationParams;
use crate::world::tile::Terrain;

const OCTAVES: u32 = 4;
/// Share of the final elevation taken from the distance-to-center falloff.
const ISLAND_BIAS: f64 = 0.6;
/// Neighbors (out of 8) that must agree before a cell is overwritten.
const SMOOTHING_MAJORITY: u8 = 5;
/// Graph distance from the shoreline at which water becomes UNDERWATER.
const UNDERWATER_DEPTH: u32 = 2;

/// Generate a row-major terrain grid. Same params and seed, same terrain.
pub fn generate_terrain(params: &GenerationParams, seed: u64) -> Vec<Terrain> {
    let (w, h) = (params.width, params.height);
    let elevation = elevation_field(w, h, seed as u32);
    let mut terrain = classify(&elevation, params.water_ratio, params.mountain_ratio);
    for _ in 0..params.smoothing_passes {
        terrain = smooth(&terrain, w, h);
    }
    stamp_beaches(&mut terrain, w, h, params.beach_distance);
    mark_underwater(&mut terrain, w, h);
    terrain
}

/// Elevation in [0, 1]: 4 octaves of Perlin noise blended with a falloff
/// that is 1 at the center of the grid and 0 at (and beyond) the edges.
pub fn elevation_field(width: u32, height: u32, seed: u32) -> Vec<f32> {
    let perlin = Perlin::new(seed);
    let base_frequency = 4.0 / width.max(height).max(1) as f64;
    let half_w = width as f64 / 2.0;
    let half_h = height as f64 / 2.0;

    let mut field = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        for x in 0..width {
            let px = x as f64 + 0.5;
            let py = y as f64 + 0.5;

            let mut sum = 0.0;
            let mut amplitude = 1.0;
            let mut total_amplitude = 0.0;
            let mut frequency = base_frequency;
            for _ in 0..OCTAVES {
                sum += amplitude * perlin.get([px * frequency, py * frequency]);
                total_amplitude += amplitude;
                amplitude *= 0.5;
                frequency *= 2.0;
            }
            let n = ((sum / total_amplitude + 1.0) / 2.0).clamp(0.0, 1.0);

            let dx = (px - half_w) / half_w;
            let dy = (py - half_h) / half_h;
            let falloff = 1.0 - (dx * dx + dy * dy).sqrt().min(1.0);

            let e = n * (1.0 - ISLAND_BIAS) + falloff * ISLAND_BIAS;
            field.push(e.clamp(0.0, 1.0) as f32);
        }
    }
    field
}

fn classify(elevation: &[f32], water_ratio: f32, mountain_ratio: f32) -> Vec<Terrain> {
    let mountain_line = 1.0 - mountain_ratio;
    elevation
        .iter()
        .map(|&e| {
            if e < water_ratio {
                Terrain::Water
            } else if e > mountain_line {
                Terrain::Mountain
            } else {
                Terrain::Grass
            }
        })
        .collect()
}

/// One majority-filter pass. Reads from `input` only, so every cell sees the
/// same pre-pass neighborhood.
pub(crate) fn smooth(input: &[Terrain], width: u32, height: u32) -> Vec<Terrain> {
    let mut output = input.to_vec();
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut counts = [0u8; Terrain::ALL.len()];
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        continue;
                    }
                    counts[input[(ny * w + nx) as usize] as usize] += 1;
                }
            }
            if let Some((idx, _)) = counts
                .iter()
                .enumerate()
                .find(|&(_, &c)| c >= SMOOTHING_MAJORITY)
            {
                output[(y * w + x) as usize] = terrain_from_index(idx);
            }
        }
    }
    output
}

fn terrain_from_index(idx: usize) -> Terrain {
    match idx {
        0 => Terrain::Water,
        1 => Terrain::Underwater,
        2 => Terrain::Beach,
        3 => Terrain::Grass,
        _ => Terrain::Mountain,
    }
}

/// GRASS within `distance` (Manhattan) of any WATER becomes BEACH.
pub(crate) fn stamp_beaches(terrain: &mut [Terrain], width: u32, height: u32, distance: u32) {
    if distance == 0 {
        return;
    }
    let (w, h) = (width as i32, height as i32);
    let d = distance as i32;
    let water: Vec<bool> = terrain.iter().map(|&t| t == Terrain::Water).collect();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if terrain[idx] != Terrain::Grass {
                continue;
            }
            let near_water = (-d..=d).any(|dy| {
                let span = d - dy.abs();
                (-span..=span).any(|dx| {
                    let (nx, ny) = (x + dx, y + dy);
                    nx >= 0 && ny >= 0 && nx < w && ny < h && water[(ny * w + nx) as usize]
                })
            });
            if near_water {
                terrain[idx] = Terrain::Beach;
            }
        }
    }
}

/// Water far from any shoreline becomes UNDERWATER.
///
/// Shoreline tiles are water tiles with a non-water orthogonal neighbor.
/// Distances are breadth-first over orthogonally connected water tiles;
/// water that no shoreline reaches counts as deep.
pub(crate) fn mark_underwater(terrain: &mut [Terrain], width: u32, height: u32) {
    let (w, h) = (width as i32, height as i32);
    let mut distance: Vec<Option<u32>> = vec![None; terrain.len()];
    let mut queue = VecDeque::new();
    const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if !terrain[idx].is_water() {
                continue;
            }
            let shoreline = ORTHOGONAL.iter().any(|&(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                nx >= 0 && ny >= 0 && nx < w && ny < h && !terrain[(ny * w + nx) as usize].is_water()
            });
            if shoreline {
                distance[idx] = Some(0);
                queue.push_back((x, y));
            }
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        let here = distance[(y * w + x) as usize].unwrap_or(0);
        for &(dx, dy) in &ORTHOGONAL {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx >= w || ny >= h {
                continue;
            }
            let n = (ny * w + nx) as usize;
            if terrain[n].is_water() && distance[n].is_none() {
                distance[n] = Some(here + 1);
                queue.push_back((nx, ny));
            }
        }
    }

    for (idx, t) in terrain.iter_mut().enumerate() {
        if *t == Terrain::Water && distance[idx].is_none_or(|d| d >= UNDERWATER_DEPTH) {
            *t = Terrain::Underwater;
        }
    }
}
