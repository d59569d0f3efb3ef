use std::collections::{BTreeMap, HashSet};

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::config::generation::GenerationParams;
use crate::world::biome::{partition_board, Biome};
use crate::world::coord::Coordinate;
use crate::world::entities::{Animal, AnimalId, Player, PlayerId, Species};
use crate::world::terrain::generate_terrain;
use crate::world::tile::{Board, Terrain};

const PLAYER_COLORS: [u32; 8] = [
    0x2E86DE, 0xE74C3C, 0x27AE60, 0xF1C40F, 0x8E44AD, 0xE67E22, 0x16A085, 0x7F8C8D,
];

/// Output of world generation: the static board plus the initial entities.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    /// Generation parameters with the resolved seed.
    pub params: GenerationParams,
    pub board: Board,
    pub biomes: Vec<Biome>,
    pub animals: Vec<Animal>,
    pub players: Vec<Player>,
    /// RNG positioned after generation, for the game to continue from.
    pub rng: ChaCha8Rng,
}

/// Generate a world with default parameters for the given size.
///
/// `None` picks a random seed. Any explicit seed, 0 included, is used as is,
/// so the same call always yields the same world.
pub fn initialize(width: u32, height: u32, seed: Option<u64>) -> GeneratedWorld {
    let params = GenerationParams {
        seed: seed.unwrap_or_else(random_seed),
        width,
        height,
        ..GenerationParams::default()
    };
    generate_seeded(&params, params.seed, default_production_rate())
}

fn random_seed() -> u64 {
    rand::thread_rng().gen_range(1..u64::MAX)
}

fn default_production_rate() -> u32 {
    crate::config::simulation::EconomyConfig::default().production_rate
}

/// Generate terrain, partition it into biomes and place the starting units.
///
/// If `params.seed` is 0, a random seed is chosen. The actual seed used is
/// stored in the returned params for reproducibility.
pub fn generate_world(params: &GenerationParams, production_rate: u32) -> GeneratedWorld {
    let seed = if params.seed == 0 { random_seed() } else { params.seed };
    generate_seeded(params, seed, production_rate)
}

fn generate_seeded(params: &GenerationParams, seed: u64, production_rate: u32) -> GeneratedWorld {
    let resolved_params = GenerationParams {
        seed,
        ..params.clone()
    };
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let terrain = generate_terrain(&resolved_params, seed);
    let board = Board::from_terrain(params.width, params.height, &terrain);
    let partition = partition_board(&board, &resolved_params, production_rate, &mut rng);

    let players: Vec<Player> = (0..params.player_count)
        .map(|i| {
            Player::new(
                PlayerId(i),
                format!("Player {}", i + 1),
                PLAYER_COLORS[i as usize % PLAYER_COLORS.len()],
            )
        })
        .collect();

    let animals = place_initial_animals(
        &partition.board,
        &partition.biomes,
        &players,
        params.wild_animals,
        &mut rng,
    );

    info!(
        seed,
        width = params.width,
        height = params.height,
        biomes = partition.biomes.len(),
        animals = animals.len(),
        "World generated"
    );

    GeneratedWorld {
        params: resolved_params,
        board: partition.board,
        biomes: partition.biomes,
        animals,
        players,
        rng,
    }
}

/// One starting animal per player (inside their biome if they own one,
/// otherwise on open grass), plus one wild animal per unclaimed biome.
fn place_initial_animals(
    board: &Board,
    biomes: &[Biome],
    players: &[Player],
    wild_animals: bool,
    rng: &mut impl Rng,
) -> Vec<Animal> {
    let mut occupied: HashSet<Coordinate> = HashSet::new();
    let mut animals = Vec::new();
    let mut next_id = 0u32;
    let mut push = |animals: &mut Vec<Animal>,
                    occupied: &mut HashSet<Coordinate>,
                    species: Species,
                    at: Coordinate,
                    owner: Option<PlayerId>| {
        occupied.insert(at);
        animals.push(Animal::new(AnimalId(next_id), species, at, owner));
        next_id += 1;
    };

    for player in players {
        let home = biomes.iter().find(|b| b.owner_id == Some(player.id));
        let placed = match home {
            Some(biome) => {
                let species = Species::for_terrain(Some(biome.terrain));
                nearest_free_tile(board, biome, species, &occupied).map(|c| (species, c))
            }
            None => random_open_tile(board, Terrain::Grass, &occupied, rng)
                .map(|c| (Species::Buffalo, c)),
        };
        match placed {
            Some((species, at)) => push(&mut animals, &mut occupied, species, at, Some(player.id)),
            None => warn!(player = player.id.0, "No room for starting animal"),
        }
    }

    if wild_animals {
        for biome in biomes.iter().filter(|b| b.owner_id.is_none()) {
            let species = Species::for_terrain(Some(biome.terrain));
            let mut spots: Vec<Coordinate> = board
                .biome_tiles(biome.id)
                .filter(|t| !t.is_habitat && species.can_enter(t.terrain))
                .map(|t| t.coordinate)
                .filter(|c| !occupied.contains(c))
                .collect();
            spots.shuffle(rng);
            if let Some(&at) = spots.first() {
                push(&mut animals, &mut occupied, species, at, None);
            }
        }
    }

    animals
}

/// Free, compatible, non-habitat tile of `biome` closest to its habitat.
fn nearest_free_tile(
    board: &Board,
    biome: &Biome,
    species: Species,
    occupied: &HashSet<Coordinate>,
) -> Option<Coordinate> {
    let home = biome.habitat.position;
    board
        .biome_tiles(biome.id)
        .filter(|t| !t.is_habitat && species.can_enter(t.terrain))
        .map(|t| t.coordinate)
        .filter(|c| !occupied.contains(c))
        .min_by_key(|c| c.manhattan(home))
}

fn random_open_tile(
    board: &Board,
    terrain: Terrain,
    occupied: &HashSet<Coordinate>,
    rng: &mut impl Rng,
) -> Option<Coordinate> {
    let candidates: Vec<Coordinate> = board
        .tiles
        .iter()
        .filter(|t| t.terrain == terrain && !t.is_habitat && !occupied.contains(&t.coordinate))
        .map(|t| t.coordinate)
        .collect();
    candidates.choose(rng).copied()
}

/// Print a summary of the generated world.
pub fn print_world_summary(world: &GeneratedWorld) {
    let total = world.board.tiles.len().max(1);
    println!("=== World Summary ===");
    println!("Size: {}x{}", world.board.width, world.board.height);
    println!("Seed: {}", world.params.seed);

    let mut terrain_counts: BTreeMap<Terrain, u32> = BTreeMap::new();
    for tile in &world.board.tiles {
        *terrain_counts.entry(tile.terrain).or_insert(0) += 1;
    }
    println!("\nTerrain:");
    for (terrain, count) in &terrain_counts {
        let pct = *count as f32 / total as f32 * 100.0;
        println!("  {:<12} {:>5} ({:.1}%)", terrain.name(), count, pct);
    }

    println!("\nBiomes: {}", world.biomes.len());
    for biome in &world.biomes {
        let size = world.board.biome_tiles(biome.id).count();
        let owner = biome
            .owner_id
            .map(|p| format!("player {}", p.0 + 1))
            .unwrap_or_else(|| "unclaimed".to_string());
        println!(
            "  #{:<3} {:<10} habitat {:<10} {:>4} tiles  #{:06X}  {}",
            biome.id.0,
            biome.terrain.name(),
            biome.habitat.position.to_string(),
            size,
            biome.color,
            owner
        );
    }

    println!("\nAnimals:");
    for animal in &world.animals {
        let owner = animal
            .owner_id
            .map(|p| format!("player {}", p.0 + 1))
            .unwrap_or_else(|| "wild".to_string());
        println!(
            "  {:<8} at {:<10} {}",
            animal.species.name(),
            animal.position.to_string(),
            owner
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::generation::InitialOwnerPolicy;

    fn default_params() -> GenerationParams {
        GenerationParams {
            seed: 42,
            width: 32,
            height: 32,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let params = default_params();
        let a = generate_world(&params, 2);
        let b = generate_world(&params, 2);
        assert_eq!(a.board, b.board);
        assert_eq!(a.biomes, b.biomes);
        assert_eq!(a.animals, b.animals);
    }

    #[test]
    fn seed_zero_generates_random() {
        let params = GenerationParams {
            seed: 0,
            ..default_params()
        };
        let world = generate_world(&params, 2);
        assert_ne!(world.params.seed, 0, "Resolved seed should be non-zero");
    }

    #[test]
    fn initialize_uses_requested_size() {
        let world = initialize(20, 12, Some(9));
        assert_eq!(world.board.width, 20);
        assert_eq!(world.board.height, 12);
        assert_eq!(world.board.tiles.len(), 240);
        assert_eq!(world.params.seed, 9);
    }

    #[test]
    fn initialize_with_seed_zero_is_reproducible() {
        let a = initialize(16, 16, Some(0));
        let b = initialize(16, 16, Some(0));
        assert_eq!(a.params.seed, 0);
        let terrain = |w: &GeneratedWorld| w.board.tiles.iter().map(|t| t.terrain).collect::<Vec<_>>();
        assert_eq!(terrain(&a), terrain(&b));
        let habitats = |w: &GeneratedWorld| w.biomes.iter().map(|b| b.habitat.position).collect::<Vec<_>>();
        assert_eq!(habitats(&a), habitats(&b));
    }

    #[test]
    fn initialize_without_seed_resolves_one() {
        assert_ne!(initialize(8, 8, None).params.seed, 0);
    }

    #[test]
    fn every_tile_belongs_to_a_biome() {
        let world = generate_world(&default_params(), 2);
        assert!(world.board.tiles.iter().all(|t| t.biome_id.is_some()));
    }

    #[test]
    fn starting_animals_never_share_tiles() {
        let world = generate_world(&default_params(), 2);
        let mut seen = HashSet::new();
        for a in &world.animals {
            assert!(seen.insert(a.position), "two animals at {}", a.position);
            let terrain = world.board.terrain_at(a.position).unwrap();
            assert!(a.species.can_enter(terrain));
            assert!(!a.has_moved);
        }
    }

    #[test]
    fn every_player_gets_a_starting_animal() {
        let world = generate_world(&default_params(), 2);
        for p in &world.players {
            assert!(
                world.animals.iter().any(|a| a.owner_id == Some(p.id)),
                "player {:?} has no animal",
                p.id
            );
        }
    }

    #[test]
    fn owned_home_animal_lives_in_home_biome() {
        let world = generate_world(&default_params(), 2);
        if let Some(home) = world.biomes.iter().find(|b| b.owner_id == Some(PlayerId(0))) {
            let animal = world
                .animals
                .iter()
                .find(|a| a.owner_id == Some(PlayerId(0)))
                .unwrap();
            assert_eq!(world.board.biome_at(animal.position), Some(home.id));
            assert_ne!(animal.position, home.habitat.position);
        }
    }

    #[test]
    fn wild_animals_can_be_disabled() {
        let params = GenerationParams {
            wild_animals: false,
            initial_owner_policy: InitialOwnerPolicy::None,
            ..default_params()
        };
        let world = generate_world(&params, 2);
        assert!(world.animals.iter().all(|a| a.owner_id.is_some()));
    }
}
