use thiserror::Error;

use crate::world::coord::Coordinate;
use crate::world::entities::{AnimalId, BiomeId, EggId, PlayerId};

pub type SimResult<T> = std::result::Result<T, SimError>;

/// Broad category of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller asked for something illegal; nothing changed.
    Validation,
    /// The snapshot is inconsistent with the request (dangling id, missing tile).
    InvariantViolation,
}

/// A rejected simulation operation. The prior snapshot is always left intact.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("unknown animal {0:?}")]
    UnknownAnimal(AnimalId),
    #[error("unknown egg {0:?}")]
    UnknownEgg(EggId),
    #[error("unknown player {0:?}")]
    UnknownPlayer(PlayerId),
    #[error("coordinate {0} is outside the board")]
    OutOfBounds(Coordinate),
    #[error("animal {animal:?} cannot move to {destination}")]
    InvalidMove {
        animal: AnimalId,
        destination: Coordinate,
    },
    #[error("animal {0:?} has already acted this turn")]
    AlreadyMoved(AnimalId),
    #[error("player {0:?} does not own this entity")]
    NotOwner(PlayerId),
    #[error("it is not player {0:?}'s turn")]
    NotCurrentPlayer(PlayerId),
    #[error("player {player:?} cannot capture biome {biome:?}")]
    CannotCapture { biome: BiomeId, player: PlayerId },
    #[error("invalid harvest amount {0}")]
    InvalidAmount(f32),
    #[error("unacknowledged events are pending")]
    PendingEvents,
    #[error("unknown biome {0:?}")]
    UnknownBiome(BiomeId),
    #[error("no tile at {0}")]
    MissingTile(Coordinate),
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::UnknownBiome(_) | SimError::MissingTile(_) | SimError::Invariant(_) => {
                ErrorKind::InvariantViolation
            }
            _ => ErrorKind::Validation,
        }
    }
}

/// A degenerate-but-survivable condition. Logged and returned alongside a
/// successful (possibly partial or no-op) outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    NoDisplacementTile { animal: AnimalId, at: Coordinate },
    NoEggPlacementTiles { biome: BiomeId },
    EmptyBoard,
}
