//! motion-agent binary entry point.
//!
//! Usage:
//! ```bash
//! motion-agent --config motion-agent.toml
//! motion-agent --check
//! motion-agent --mock
//! ```

use anyhow::Result;
use clap::Parser;
use motion_kvs_agent::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Motion-triggered camera streaming agent.
#[derive(Parser, Debug)]
#[command(name = "motion-agent")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "motion-agent.toml")]
    config: PathBuf,

    /// Use an in-memory shadow and an idle sensor instead of the device (for testing/demo)
    #[arg(long)]
    mock: bool,

    /// Validate configuration and credentials, then exit
    #[arg(long, conflicts_with = "mock")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = if cli.mock && !cli.config.exists() {
        Config::default()
    } else {
        Config::from_file(&cli.config)?
    };

    if cli.check {
        motion_kvs_agent::check(&config)?;
        println!("Configuration OK: {}", cli.config.display());
        return Ok(());
    }

    tracing::info!("motion-agent v{}", env!("CARGO_PKG_VERSION"));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let result = if cli.mock {
        motion_kvs_agent::run_mock(&config, shutdown).await
    } else {
        motion_kvs_agent::run(&config, shutdown).await
    };

    if let Err(e) = result {
        tracing::error!("Fatal: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
