use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::world::coord::Neighborhood;

/// Tunables of the resource-lushness economy and egg production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Cubic coefficient of the regeneration polynomial.
    pub regen_a: f32,
    pub regen_b: f32,
    pub regen_c: f32,
    pub regen_d: f32,
    pub max_resource_value: f32,
    pub max_lushness: f32,
    pub max_lushness_boost: f32,
    pub egg_production_threshold: f32,
    /// Eggs a biome lays per production, stamped on new biomes.
    pub production_rate: u32,
    /// Production only happens on turns divisible by this.
    pub production_interval: u32,
    pub owned_resource_weight: u32,
    pub other_resource_weight: u32,
    /// Adjacency counted when ranking egg placement tiles. Independent of
    /// the movement ruleset.
    pub egg_neighborhood: Neighborhood,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            regen_a: -0.0015,
            regen_b: 0.043,
            regen_c: 0.04,
            regen_d: 0.1,
            max_resource_value: 10.0,
            max_lushness: 8.0,
            max_lushness_boost: 2.0,
            egg_production_threshold: 7.0,
            production_rate: 2,
            production_interval: 2,
            owned_resource_weight: 3,
            other_resource_weight: 1,
            egg_neighborhood: Neighborhood::Eight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub neighborhood: Neighborhood,
    /// Occupied tiles at the edge of a unit's reach become push targets.
    pub displace_on_move: bool,
}

impl Default for MovementConfig {
    fn default() -> Self {
        MovementConfig {
            neighborhood: Neighborhood::Eight,
            displace_on_move: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_fog_of_war")]
    pub fog_of_war: bool,
    #[serde(default)]
    pub require_event_ack: bool,
    #[serde(default)]
    pub economy: EconomyConfig,
    #[serde(default)]
    pub movement: MovementConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_fog_of_war() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            log_level: default_log_level(),
            fog_of_war: default_fog_of_war(),
            require_event_ack: false,
            economy: EconomyConfig::default(),
            movement: MovementConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: SimulationConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();
        let eco = &self.economy;

        if eco.max_resource_value <= 0.0 {
            errors.push(format!(
                "economy.max_resource_value must be > 0.0, got {}. Example: max_resource_value = 10.0",
                eco.max_resource_value
            ));
        }

        if eco.max_lushness <= 0.0 {
            errors.push(format!(
                "economy.max_lushness must be > 0.0, got {}. Example: max_lushness = 8.0",
                eco.max_lushness
            ));
        }

        if eco.max_lushness_boost < 0.0 {
            errors.push(format!(
                "economy.max_lushness_boost must be >= 0.0, got {}. Example: max_lushness_boost = 2.0",
                eco.max_lushness_boost
            ));
        }

        if eco.egg_production_threshold < 0.0 {
            errors.push(format!(
                "economy.egg_production_threshold must be >= 0.0, got {}. Example: egg_production_threshold = 7.0",
                eco.egg_production_threshold
            ));
        }

        if eco.production_interval == 0 {
            errors.push(format!(
                "economy.production_interval must be > 0, got {}. Example: production_interval = 2",
                eco.production_interval
            ));
        }

        let coeffs = [eco.regen_a, eco.regen_b, eco.regen_c, eco.regen_d];
        if coeffs.iter().any(|c| !c.is_finite()) {
            errors.push(format!(
                "economy.regen_a..regen_d must be finite, got {:?}",
                coeffs
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                valid_levels, self.log_level
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }
}
