//! Territory CLI - Command-line interface
//!
//! Serves land-clipped Voronoi partitions, warms their caches ahead of
//! traffic and manages configuration.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::prewarm::PrewarmArgs;
use commands::serve::ServeArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "territory")]
#[command(version = territory::VERSION)]
#[command(about = "Land-clipped Voronoi partitions around points of interest", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.territory/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve clipped polygons over HTTP
    Serve(ServeArgs),

    /// Generate clipped polygons for one or both tiers ahead of traffic
    Prewarm(PrewarmArgs),

    /// Inspect or invalidate persisted artifacts
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        e.exit();
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Config { command } => commands::config::run(command, config_path),
        Commands::Serve(args) => {
            let runner = CliRunner::new(config_path)?;
            commands::serve::run(&runner, args).await
        }
        Commands::Prewarm(args) => {
            let runner = CliRunner::new(config_path)?;
            commands::prewarm::run(&runner, args).await
        }
        Commands::Cache { action } => {
            let runner = CliRunner::new(config_path)?;
            commands::cache::run(&runner, action).await
        }
    }
}
