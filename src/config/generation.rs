use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which habitat seed, if any, starts out owned by the first player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitialOwnerPolicy {
    /// The first seed placed on a BEACH tile. No beach seed, no owner.
    #[default]
    FirstBeach,
    /// Every biome starts unclaimed.
    None,
}

/// Parameters used to procedurally generate a game board.
/// Stored with the game state for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub water_ratio: f32,
    pub mountain_ratio: f32,
    #[serde(default = "default_smoothing_passes")]
    pub smoothing_passes: u32,
    #[serde(default = "default_beach_distance")]
    pub beach_distance: u32,
    #[serde(default = "default_min_seed_distance")]
    pub min_seed_distance: u32,
    #[serde(default = "default_seed_search_attempts")]
    pub seed_search_attempts: u32,
    #[serde(default = "default_extra_seed_iterations")]
    pub extra_seed_iterations: u32,
    pub resource_density: f32,
    #[serde(default = "default_player_count")]
    pub player_count: u32,
    #[serde(default)]
    pub initial_owner_policy: InitialOwnerPolicy,
    #[serde(default = "default_wild_animals")]
    pub wild_animals: bool,
}

fn default_smoothing_passes() -> u32 {
    3
}
fn default_beach_distance() -> u32 {
    1
}
fn default_min_seed_distance() -> u32 {
    5
}
fn default_seed_search_attempts() -> u32 {
    200
}
fn default_extra_seed_iterations() -> u32 {
    64
}
fn default_player_count() -> u32 {
    2
}
fn default_wild_animals() -> bool {
    true
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            seed: 0,
            width: 32,
            height: 32,
            water_ratio: 0.35,
            mountain_ratio: 0.15,
            smoothing_passes: default_smoothing_passes(),
            beach_distance: default_beach_distance(),
            min_seed_distance: default_min_seed_distance(),
            seed_search_attempts: default_seed_search_attempts(),
            extra_seed_iterations: default_extra_seed_iterations(),
            resource_density: 0.4,
            player_count: default_player_count(),
            initial_owner_policy: InitialOwnerPolicy::FirstBeach,
            wild_animals: default_wild_animals(),
        }
    }
}

impl GenerationParams {
    /// Load generation parameters from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        let params: Self = toml::from_str(&content)
            .map_err(|e| format!("Invalid TOML in {}: {}", path.display(), e))?;
        params.validate()?;
        Ok(params)
    }

    /// Validate parameter ranges.
    pub fn validate(&self) -> Result<(), String> {
        if !(4..=512).contains(&self.width) || !(4..=512).contains(&self.height) {
            return Err(format!(
                "width and height must be 4-512, got {}x{}",
                self.width, self.height
            ));
        }
        if !(0.0..=1.0).contains(&self.water_ratio) {
            return Err(format!(
                "water_ratio must be 0.0-1.0, got {}",
                self.water_ratio
            ));
        }
        if !(0.0..=1.0).contains(&self.mountain_ratio) {
            return Err(format!(
                "mountain_ratio must be 0.0-1.0, got {}",
                self.mountain_ratio
            ));
        }
        if self.water_ratio + self.mountain_ratio > 1.0 {
            return Err(format!(
                "water_ratio + mountain_ratio must be <= 1.0, got {}",
                self.water_ratio + self.mountain_ratio
            ));
        }
        if self.smoothing_passes > 16 {
            return Err(format!(
                "smoothing_passes must be 0-16, got {}",
                self.smoothing_passes
            ));
        }
        if self.min_seed_distance == 0 {
            return Err("min_seed_distance must be >= 1, got 0".to_string());
        }
        if self.seed_search_attempts == 0 {
            return Err("seed_search_attempts must be >= 1, got 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.resource_density) {
            return Err(format!(
                "resource_density must be 0.0-1.0, got {}",
                self.resource_density
            ));
        }
        if !(1..=8).contains(&self.player_count) {
            return Err(format!(
                "player_count must be 1-8, got {}",
                self.player_count
            ));
        }
        Ok(())
    }
}
