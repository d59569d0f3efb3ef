use crate::config::generation::GenerationParams;
use crate::config::simulation::SimulationConfig;
use crate::simulation::agent::{PassAgent, PlayerAgent};
use crate::simulation::statistics::RoundStatistics;
use crate::simulation::{GameState, Simulation};
use crate::world::coord::Coordinate;
use crate::world::entities::BiomeId;
use crate::world::generation::{generate_world, print_world_summary};

/// Generate a world, print its summary and optionally the opening snapshot as JSON.
pub fn generate(
    params: &GenerationParams,
    config: &SimulationConfig,
    json: bool,
) -> Result<(), String> {
    let world = generate_world(params, config.economy.production_rate);
    print_world_summary(&world);

    if json {
        let sim = Simulation::new(world, config.clone()).map_err(|e| e.to_string())?;
        let out = serde_json::to_string_pretty(&*sim.snapshot())
            .map_err(|e| format!("Cannot serialize snapshot: {}", e))?;
        println!("{}", out);
    }
    Ok(())
}

/// Run `rounds` full rounds with passive agents, printing statistics per round.
pub fn simulate(
    params: &GenerationParams,
    config: &SimulationConfig,
    rounds: u32,
) -> Result<(), String> {
    let mut sim = Simulation::generate(params, config.clone()).map_err(|e| e.to_string())?;
    let players = sim.snapshot().players.len();
    let mut agents: Vec<Box<dyn PlayerAgent>> = (0..players)
        .map(|_| Box::new(PassAgent) as Box<dyn PlayerAgent>)
        .collect();

    eprintln!(
        "Simulating {} round(s) on a {}x{} board (seed {})",
        rounds,
        params.width,
        params.height,
        sim.snapshot().generation_params.seed
    );
    println!(
        "{:>6} {:>7} {:>9} {:>9} {:>6} {:>8} {:>9}",
        "Turn", "Owned", "Lushness", "Resources", "Eggs", "Animals", "Diversity"
    );
    println!("{}", "-".repeat(62));
    for _ in 0..rounds {
        let stats = sim.run_round(&mut agents).map_err(|e| e.to_string())?;
        print_round(&stats);
    }
    Ok(())
}

fn print_round(stats: &RoundStatistics) {
    println!(
        "{:>6} {:>7} {:>9.2} {:>9} {:>6} {:>8} {:>9.3}",
        stats.turn,
        stats.owned_biomes,
        stats.avg_lushness,
        stats.active_resources,
        stats.eggs,
        stats.animals,
        stats.diversity_index
    );
}

/// Inspect a tile or a biome of the opening state of the configured world.
pub fn inspect(
    params: &GenerationParams,
    config: &SimulationConfig,
    tile: Option<Coordinate>,
    biome: Option<u32>,
) -> Result<(), String> {
    let sim = Simulation::generate(params, config.clone()).map_err(|e| e.to_string())?;
    let state = sim.snapshot();

    if let Some(at) = tile {
        inspect_tile(&state, at)
    } else if let Some(id) = biome {
        inspect_biome(&state, BiomeId(id))
    } else {
        Err("Specify --tile <X,Y> or --biome <ID>".to_string())
    }
}

fn inspect_tile(state: &GameState, at: Coordinate) -> Result<(), String> {
    let tile = state.board.tile(at).ok_or_else(|| {
        format!(
            "Tile {} not found (board is {}x{})",
            at, state.board.width, state.board.height
        )
    })?;

    println!("=== Tile {} ===", at);
    println!("  Terrain: {}", tile.terrain.name());
    match tile.biome_id {
        Some(id) => println!("  Biome: #{}{}", id.0, if tile.is_habitat { " (habitat)" } else { "" }),
        None => println!("  Biome: (none)"),
    }
    println!();
    println!("--- Resource ---");
    match state.resources.get(&at) {
        Some(r) => println!(
            "  {:?}: {:.1} ({})",
            r.kind,
            r.value(),
            if r.is_active() { "active" } else { "depleted" }
        ),
        None => println!("  (none)"),
    }
    println!();
    println!("--- Occupants ---");
    let mut empty = true;
    if let Some(a) = state.animal_at(at) {
        empty = false;
        let owner = a
            .owner_id
            .map(|p| format!("player {}", p.0 + 1))
            .unwrap_or_else(|| "wild".to_string());
        println!("  {} #{} ({}, facing {:?})", a.species.name(), a.id.0, owner, a.facing);
    }
    if let Some(e) = state.egg_at(at) {
        empty = false;
        println!("  Egg #{} of player {} (laid turn {})", e.id.0, e.owner_id.0 + 1, e.created_at_turn);
    }
    if empty {
        println!("  (none)");
    }
    Ok(())
}

fn inspect_biome(state: &GameState, id: BiomeId) -> Result<(), String> {
    let biome = state.biome(id).map_err(|e| e.to_string())?;
    let tiles = state.board.biome_tiles(id).count();
    let resources: Vec<_> = state
        .resources
        .values()
        .filter(|r| r.biome_id == Some(id))
        .collect();
    let active = resources.iter().filter(|r| r.is_active()).count();

    println!("=== Biome #{} ===", id.0);
    println!("  Terrain: {}", biome.terrain.name());
    println!("  Habitat: {}", biome.habitat.position);
    println!("  Color: #{:06X}", biome.color);
    println!(
        "  Owner: {}",
        biome
            .owner_id
            .map(|p| format!("player {}", p.0 + 1))
            .unwrap_or_else(|| "unclaimed".to_string())
    );
    println!("  Tiles: {}", tiles);
    println!();
    println!("--- Lushness ---");
    println!("  Base: {:.3}", biome.base_lushness());
    println!("  Boost: {:.3}", biome.lushness_boost());
    println!("  Total: {:.3}", biome.total_lushness());
    println!();
    println!("--- Economy ---");
    println!("  Resources: {} active / {} initial", active, biome.initial_resource_count);
    println!("  Non-depleted: {}", biome.non_depleted_count);
    println!("  Harvested: {:.1}", biome.total_harvested);
    println!("  Production rate: {} eggs", biome.production_rate);
    println!("  Last production: turn {}", biome.last_production_turn);
    Ok(())
}
