pub mod generation;
pub mod simulation;

pub use generation::{GenerationParams, InitialOwnerPolicy};
pub use simulation::{EconomyConfig, MovementConfig, SimulationConfig};
