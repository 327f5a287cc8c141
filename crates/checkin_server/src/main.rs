//! checkind
//!
//! The check-in server daemon. Loads a TOML config, opens the check log,
//! binds the listener, and serves until killed.

use checkin_server::{CheckLog, CheckinServer, ServerConfig};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Check-in server daemon.
#[derive(Parser)]
#[command(name = "checkind")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, default_value = "checkind.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::load(&cli.config)?;
    let sink = Arc::new(CheckLog::open(&config.store_path)?);

    let server = CheckinServer::bind(config, sink).await?;
    server.run().await?;

    Ok(())
}
