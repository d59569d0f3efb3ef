use std::fmt;

use glam::IVec2;
use serde::{Deserialize, Serialize};

/// Integer grid position. Row-major ordering (y, then x) so ordered
/// collections iterate in board scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Coordinate) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    pub fn offset(self, delta: IVec2) -> Coordinate {
        Coordinate::new(self.x + delta.x, self.y + delta.y)
    }

    /// Vector from `self` to `other`.
    pub fn delta_to(self, other: Coordinate) -> IVec2 {
        IVec2::new(other.x - self.x, other.y - self.y)
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.y.cmp(&other.y).then(self.x.cmp(&other.x))
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = String;

    /// Parses `"x,y"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected 'x,y', got '{}'", s))?;
        let x = x
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("bad x in '{}': {}", s, e))?;
        let y = y
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("bad y in '{}': {}", s, e))?;
        Ok(Coordinate::new(x, y))
    }
}

/// Orthogonal neighbor offsets: east, west, north, south.
const FOUR_NEIGHBORS: [IVec2; 4] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
];

/// Orthogonal offsets followed by the diagonals.
const EIGHT_NEIGHBORS: [IVec2; 8] = [
    IVec2::new(1, 0),
    IVec2::new(-1, 0),
    IVec2::new(0, -1),
    IVec2::new(0, 1),
    IVec2::new(1, -1),
    IVec2::new(-1, -1),
    IVec2::new(1, 1),
    IVec2::new(-1, 1),
];

/// Which tiles count as adjacent for movement and displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    Four,
    Eight,
}

impl Neighborhood {
    pub fn offsets(self) -> &'static [IVec2] {
        match self {
            Neighborhood::Four => &FOUR_NEIGHBORS,
            Neighborhood::Eight => &EIGHT_NEIGHBORS,
        }
    }

    pub fn contains(self, delta: IVec2) -> bool {
        self.offsets().contains(&delta)
    }

    /// Neighbor coordinates in offset order. Bounds are not checked.
    pub fn around(self, c: Coordinate) -> impl Iterator<Item = Coordinate> {
        self.offsets().iter().map(move |&d| c.offset(d))
    }
}
