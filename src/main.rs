use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use ecoterra::cli::commands;
use ecoterra::config::generation::GenerationParams;
use ecoterra::config::simulation::SimulationConfig;
use ecoterra::world::coord::Coordinate;

#[derive(Parser)]
#[command(name = "ecoterra")]
#[command(about = "A turn-based ecosystem and territory simulation with procedural biomes")]
#[command(version)]
struct Cli {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Path to the world generation config file
    #[arg(short, long, default_value = "worldgen.toml")]
    worldgen: String,

    /// Override the generation seed
    #[arg(short, long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new world and print its summary
    Generate {
        /// Also print the opening game snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play rounds with passive agents and print per-round statistics
    Simulate {
        /// Number of full rounds to run
        #[arg(short, long, default_value_t = 10)]
        rounds: u32,
    },

    /// Inspect a tile or biome of the generated world
    Inspect {
        /// Tile coordinate as X,Y
        #[arg(short, long)]
        tile: Option<Coordinate>,

        /// Biome ID to inspect
        #[arg(short, long)]
        biome: Option<u32>,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();

    let config = match SimulationConfig::from_file(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    let mut params = match GenerationParams::from_file(Path::new(&cli.worldgen)) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error loading generation config: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(seed) = cli.seed {
        params.seed = seed;
    }

    init_logging(&config.log_level);

    let result = match cli.command {
        Commands::Generate { json } => {
            eprintln!("Generating world from {}...", cli.worldgen);
            commands::generate(&params, &config, json)
        }
        Commands::Simulate { rounds } => commands::simulate(&params, &config, rounds),
        Commands::Inspect { tile, biome } => commands::inspect(&params, &config, tile, biome),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
