//! Hitplace CLI - replay scripted AR sessions and inspect models

#![warn(missing_docs)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

mod commands;
mod config;

use commands::{inspect, settings, simulate};

#[derive(Parser)]
#[command(name = "hitplace")]
#[command(about = "Hit-test placement and frame-rate measurement tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, env = "HITPLACE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scripted AR session
    Simulate {
        /// Scenario file (defaults to the built-in demo session)
        scenario: Option<PathBuf>,

        /// Directory for exported files (defaults to export.output_dir, then the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the node hierarchy of a model
    InspectModel {
        /// Catalog key or path to a .gltf/.glb file
        target: String,
    },

    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Target file (defaults to ~/.hitplace/config.toml)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `--json` output stays parseable
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config(ConfigCommands::Init { path, force }) => {
            settings::init(path, force)?;
        }

        Commands::Config(ConfigCommands::Show) => {
            let config = config::load_config(cli.config)?;
            settings::show(&config)?;
        }

        Commands::Simulate {
            scenario,
            output,
            json,
        } => {
            let config = config::load_config(cli.config)?;
            simulate::simulate(scenario, output, json, &config).await?;
        }

        Commands::InspectModel { target } => {
            let config = config::load_config(cli.config)?;
            inspect::inspect_model(&target, &config).await?;
        }
    }

    Ok(())
}
