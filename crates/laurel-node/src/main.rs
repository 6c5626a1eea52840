use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

mod config;
mod logging;
mod node;

use config::NodeConfig;
use node::LaurelNode;

#[derive(Parser)]
#[command(name = "laurel")]
#[command(about = "Laurel - Ranking & Reward Distribution Engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the recomputation loop
    Start {
        /// Data directory
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Seconds between recomputation passes
        #[arg(short, long)]
        interval: Option<u64>,

        /// Seed a small demo world into the in-memory collaborators
        #[arg(long)]
        seed_demo: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output directory for the configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<NodeConfig> {
    let mut config = match path {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Start {
            data_dir,
            interval,
            seed_demo,
        } => {
            config.node.data_dir = data_dir;
            if let Some(interval) = interval {
                config.engine.recompute_interval_secs = interval;
            }

            logging::init_logging(&config.logging, cli.verbose)?;
            logging::display_boot_banner(env!("CARGO_PKG_VERSION"));

            let node = LaurelNode::new(config);
            if seed_demo {
                node.seed_demo().await?;
            }
            node.run().await
        }
        Commands::Init { output } => {
            logging::init_logging(&config.logging, cli.verbose)?;

            std::fs::create_dir_all(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let path = output.join("laurel.toml");
            config.save_to_file(&path)?;
            info!(path = %path.display(), "⚙️ Default configuration written");
            Ok(())
        }
    }
}
