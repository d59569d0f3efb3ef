use serde::{Deserialize, Serialize};

use crate::world::coord::Coordinate;
use crate::world::entities::BiomeId;

// === Enums ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Terrain {
    Water,
    Underwater,
    Beach,
    Grass,
    Mountain,
}

impl Terrain {
    pub const ALL: [Terrain; 5] = [
        Terrain::Grass,
        Terrain::Water,
        Terrain::Mountain,
        Terrain::Beach,
        Terrain::Underwater,
    ];

    pub fn is_water(self) -> bool {
        matches!(self, Terrain::Water | Terrain::Underwater)
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Water => "Water",
            Terrain::Underwater => "Underwater",
            Terrain::Beach => "Beach",
            Terrain::Grass => "Grass",
            Terrain::Mountain => "Mountain",
        }
    }
}

// === Tile ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coordinate: Coordinate,
    pub terrain: Terrain,
    pub biome_id: Option<BiomeId>,
    pub is_habitat: bool,
}

impl Tile {
    pub fn new(coordinate: Coordinate, terrain: Terrain) -> Self {
        Self {
            coordinate,
            terrain,
            biome_id: None,
            is_habitat: false,
        }
    }
}

// === Board ===

/// Row-major tile grid. Immutable once generation has finished; the game
/// state shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Tile>,
}

impl Board {
    /// Build a board from a row-major terrain grid.
    pub fn from_terrain(width: u32, height: u32, terrain: &[Terrain]) -> Self {
        debug_assert_eq!(terrain.len(), (width * height) as usize);
        let tiles = terrain
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let x = (i as u32 % width) as i32;
                let y = (i as u32 / width) as i32;
                Tile::new(Coordinate::new(x, y), t)
            })
            .collect();
        Self {
            width,
            height,
            tiles,
        }
    }

    pub fn in_bounds(&self, c: Coordinate) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as u32) < self.width && (c.y as u32) < self.height
    }

    pub fn index_of(&self, c: Coordinate) -> Option<usize> {
        if self.in_bounds(c) {
            Some(c.y as usize * self.width as usize + c.x as usize)
        } else {
            None
        }
    }

    pub fn tile(&self, c: Coordinate) -> Option<&Tile> {
        self.index_of(c).map(|i| &self.tiles[i])
    }

    pub fn terrain_at(&self, c: Coordinate) -> Option<Terrain> {
        self.tile(c).map(|t| t.terrain)
    }

    pub fn biome_at(&self, c: Coordinate) -> Option<BiomeId> {
        self.tile(c).and_then(|t| t.biome_id)
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.tiles.iter().map(|t| t.coordinate)
    }

    /// Tiles assigned to `biome`, in scan order.
    pub fn biome_tiles(&self, biome: BiomeId) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles
            .iter()
            .filter(move |t| t.biome_id == Some(biome))
    }
}
