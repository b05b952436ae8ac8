//! RenderPilot CLI - Command-line interface
//!
//! Benchmarks the quality preset ladder, replays adaptive sessions and
//! progressive loads against simulated hardware, and edits the
//! configuration file.

mod commands;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use renderpilot::{init_logging, ConfigFile, LoggingGuard};

use commands::benchmark::BenchmarkArgs;
use commands::common::load_config;
use commands::config::ConfigCommands;
use commands::load::LoadArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "renderpilot")]
#[command(about = "Adaptive render quality: benchmark, simulate and configure")]
#[command(version)]
struct Cli {
    /// Configuration file to use instead of the user config
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. debug or renderpilot::resolution=trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure every quality preset and recommend one
    Benchmark(BenchmarkArgs),

    /// Run an adaptive session against a modeled GPU
    Simulate(SimulateArgs),

    /// Compile the requested capabilities progressively
    Load(LoadArgs),

    /// View or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let file = cli.config.as_deref();
    match cli.command {
        Commands::Config { command } => commands::config::run(command, file),
        Commands::Benchmark(args) => {
            let (config, _guard) = setup(file, cli.log_level)?;
            commands::benchmark::run(args, &config)
        }
        Commands::Simulate(args) => {
            let (config, _guard) = setup(file, cli.log_level)?;
            commands::simulate::run(args, &config)
        }
        Commands::Load(args) => {
            let (config, _guard) = setup(file, cli.log_level)?;
            commands::load::run(args, &config)
        }
    }
}

/// Load the configuration and start logging. Keep the guard alive for the
/// whole command.
fn setup(
    file: Option<&Path>,
    log_level: Option<String>,
) -> Result<(ConfigFile, LoggingGuard), CliError> {
    let config = load_config(file)?;
    let mut logging = config.logging.clone();
    if let Some(level) = log_level {
        logging.level = level;
    }
    let guard = init_logging(&logging)?;
    Ok((config, guard))
}
