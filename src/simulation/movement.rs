use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use glam::IVec2;
use rand::prelude::*;
use tracing::{debug, warn};

use crate::config::simulation::MovementConfig;
use crate::error::{SimError, SimResult, Warning};
use crate::simulation::events::DisplacementEvent;
use crate::simulation::state::occupancy;
use crate::world::coord::{Coordinate, Neighborhood};
use crate::world::entities::{Animal, AnimalId};
use crate::world::tile::Board;

/// Tiles `animal_id` may move to this turn, in breadth-first discovery order.
///
/// Traversal stays on compatible terrain and never passes through another
/// animal. With `displace_on_move`, an occupied compatible tile next to a
/// reached tile is still listed (a push target) but not expanded. Eggs never
/// block.
pub fn calculate_valid_moves(
    animal_id: AnimalId,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    rules: &MovementConfig,
) -> SimResult<Vec<Coordinate>> {
    let animal = animals
        .get(&animal_id)
        .ok_or(SimError::UnknownAnimal(animal_id))?;
    if !board.in_bounds(animal.position) {
        return Err(SimError::MissingTile(animal.position));
    }
    if animal.has_moved {
        return Ok(Vec::new());
    }

    let occupied = occupancy(animals);
    let range = animal.species.movement_range();
    let mut visited: HashSet<Coordinate> = HashSet::from([animal.position]);
    let mut queue: VecDeque<(Coordinate, u32)> = VecDeque::from([(animal.position, 0)]);
    let mut reachable = Vec::new();

    while let Some((current, depth)) = queue.pop_front() {
        if depth >= range {
            continue;
        }
        for next in rules.neighborhood.around(current) {
            if visited.contains(&next) {
                continue;
            }
            let Some(terrain) = board.terrain_at(next) else {
                continue;
            };
            if !animal.species.can_enter(terrain) {
                continue;
            }
            if occupied.get(&next).is_some_and(|&id| id != animal_id) {
                if rules.displace_on_move {
                    visited.insert(next);
                    reachable.push(next);
                }
                continue;
            }
            visited.insert(next);
            reachable.push(next);
            queue.push_back((next, depth + 1));
        }
    }
    Ok(reachable)
}

/// Where `occupant` should be pushed to, if anywhere.
///
/// A unit that already moved this turn keeps going the way it came: first
/// the same direction, then the neighbors sharing one axis of it. Otherwise,
/// or when those are blocked, a random vacant compatible neighbor is used.
pub fn find_displacement_tile(
    occupant: &Animal,
    board: &Board,
    occupied: &HashMap<Coordinate, AnimalId>,
    neighborhood: Neighborhood,
    rng: &mut impl Rng,
) -> Option<Coordinate> {
    let vacant = |c: Coordinate| {
        board
            .terrain_at(c)
            .is_some_and(|t| occupant.species.can_enter(t))
            && !occupied.contains_key(&c)
    };

    if let Some(dir) = previous_direction(occupant) {
        let preferred = std::iter::once(dir).chain(alternates(dir));
        for delta in preferred.filter(|d| neighborhood.contains(*d)) {
            let c = occupant.position.offset(delta);
            if vacant(c) {
                return Some(c);
            }
        }
    }

    let options: Vec<Coordinate> = neighborhood
        .around(occupant.position)
        .filter(|&c| vacant(c))
        .collect();
    options.choose(rng).copied()
}

/// Unit step of the occupant's last move, if it moved this turn.
fn previous_direction(animal: &Animal) -> Option<IVec2> {
    if !animal.has_moved {
        return None;
    }
    let prev = animal.previous_position?;
    let dir = prev.delta_to(animal.position).signum();
    (dir != IVec2::ZERO).then_some(dir)
}

/// Neighbors of `dir` that keep one of its axis components.
fn alternates(dir: IVec2) -> [IVec2; 2] {
    match (dir.x, dir.y) {
        (x, y) if x != 0 && y != 0 => [IVec2::new(x, 0), IVec2::new(0, y)],
        (x, 0) => [IVec2::new(x, 1), IVec2::new(x, -1)],
        (_, y) => [IVec2::new(1, y), IVec2::new(-1, y)],
    }
}

/// Push the animal standing on `at` out of the way.
///
/// Returns the updated animals and the event, or the warning when no tile
/// is free (animals unchanged).
pub fn displace(
    at: Coordinate,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    neighborhood: Neighborhood,
    timestamp: u64,
    rng: &mut impl Rng,
) -> Result<Option<(BTreeMap<AnimalId, Animal>, DisplacementEvent)>, Warning> {
    let occupied = occupancy(animals);
    let Some(occupant) = occupied.get(&at).and_then(|id| animals.get(id)) else {
        return Ok(None);
    };
    let Some(target) = find_displacement_tile(occupant, board, &occupied, neighborhood, rng) else {
        warn!(
            animal = occupant.id.0,
            x = at.x,
            y = at.y,
            "No vacant tile to displace animal onto"
        );
        return Err(Warning::NoDisplacementTile {
            animal: occupant.id,
            at,
        });
    };

    let mut next = animals.clone();
    if let Some(a) = next.get_mut(&occupant.id) {
        a.relocate(target);
    }
    debug!(animal = occupant.id.0, from = %at, to = %target, "Animal displaced");
    Ok(Some((
        next,
        DisplacementEvent {
            unit_id: occupant.id,
            from: at,
            to: target,
            timestamp,
        },
    )))
}

#[derive(Debug, Clone)]
pub struct MoveOutcome {
    pub animals: BTreeMap<AnimalId, Animal>,
    pub displacement: Option<DisplacementEvent>,
    pub warnings: Vec<Warning>,
    /// False when a blocked push left everything in place.
    pub moved: bool,
}

/// Move `animal_id` to `destination`, pushing any animal already there.
///
/// The destination is checked against a freshly computed range.
pub fn move_animal(
    animal_id: AnimalId,
    destination: Coordinate,
    board: &Board,
    animals: &BTreeMap<AnimalId, Animal>,
    rules: &MovementConfig,
    timestamp: u64,
    rng: &mut impl Rng,
) -> SimResult<MoveOutcome> {
    if !board.in_bounds(destination) {
        return Err(SimError::OutOfBounds(destination));
    }
    let animal = animals
        .get(&animal_id)
        .ok_or(SimError::UnknownAnimal(animal_id))?;
    if animal.has_moved {
        return Err(SimError::AlreadyMoved(animal_id));
    }
    let range = calculate_valid_moves(animal_id, board, animals, rules)?;
    if !range.contains(&destination) {
        return Err(SimError::InvalidMove {
            animal: animal_id,
            destination,
        });
    }

    let (mut next, displacement) =
        match displace(destination, board, animals, rules.neighborhood, timestamp, rng) {
            Ok(Some((next, event))) => (next, Some(event)),
            Ok(None) => (animals.clone(), None),
            Err(warning) => {
                return Ok(MoveOutcome {
                    animals: animals.clone(),
                    displacement: None,
                    warnings: vec![warning],
                    moved: false,
                });
            }
        };

    if let Some(a) = next.get_mut(&animal_id) {
        a.relocate(destination);
        a.has_moved = true;
    }
    debug!(animal = animal_id.0, to = %destination, "Animal moved");
    Ok(MoveOutcome {
        animals: next,
        displacement,
        warnings: Vec::new(),
        moved: true,
    })
}
