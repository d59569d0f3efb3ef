pub mod biome;
pub mod coord;
pub mod entities;
pub mod generation;
pub mod terrain;
pub mod tile;

pub use biome::Biome;
pub use coord::{Coordinate, Neighborhood};
pub use entities::{
    Animal, AnimalId, BiomeId, Egg, EggId, Facing, Player, PlayerId, Resource, ResourceId,
    ResourceKind, Species,
};
pub use generation::{generate_world, initialize, GeneratedWorld};
pub use tile::{Board, Terrain, Tile};
