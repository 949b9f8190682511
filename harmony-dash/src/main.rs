//! harmony-dash - Artist dashboard fetcher
//!
//! Resolves upstream credentials, runs one dashboard aggregation and prints
//! the artist records as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use harmony_common::config::{self, TomlConfig};
use std::path::PathBuf;
use tracing::info;

use harmony_dash::Aggregator;

#[derive(Debug, Parser)]
#[command(name = "harmony-dash", version, about = "Fetch artists and their top tracks")]
struct Args {
    /// Config file (default: <config dir>/harmony/harmony.toml)
    #[arg(long, env = "HARMONY_CONFIG")]
    config: Option<PathBuf>,

    /// Artist to fetch (repeatable; replaces the configured list)
    #[arg(long = "artist")]
    artists: Vec<String>,

    /// Write a config file with default values and exit
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(config::default_config_path)
        .context("Could not determine config directory; pass --config")?;

    if args.init_config {
        config::write_toml_config(&TomlConfig::default(), &config_path)?;
        println!("Wrote default config to {}", config_path.display());
        return Ok(());
    }

    let loaded = config::read_toml_config(&config_path)?;
    let config_found = loaded.is_some();
    let toml_config = loaded.unwrap_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&toml_config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting harmony-dash v{}", env!("CARGO_PKG_VERSION"));
    if config_found {
        info!("Config: {}", config_path.display());
    } else {
        config::warn_config_missing(&config_path);
    }

    let credentials = config::resolve_client_credentials(&toml_config)?;
    let aggregator = Aggregator::from_config(&toml_config, credentials)?;

    let records = if args.artists.is_empty() {
        aggregator.fetch_dashboard().await?
    } else {
        aggregator.fetch_all(args.artists.as_slice()).await?
    };

    info!(artists = records.len(), "Dashboard ready");
    println!("{}", serde_json::to_string_pretty(&records)?);

    Ok(())
}
