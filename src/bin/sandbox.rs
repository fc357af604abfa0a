//! Fee Sentinel Sandbox Server
//!
//! Run with: cargo run --bin fee-sentinel-sandbox -- [--config <PATH>]
//!
//! # Configuration
//!
//! Reads the `[sandbox]` and `[logging]` sections of the config file, then
//! environment variables:
//! - `FEE_SENTINEL_SANDBOX_HOST`: Host to bind to (default: 127.0.0.1)
//! - `FEE_SENTINEL_SANDBOX_PORT`: Port to listen on (default: 5000)
//! - `FEE_SENTINEL_LOG_LEVEL`: Log level (default: warn)
//! - `RUST_LOG`: Full filter, wins over the log level

use clap::Parser;
use fee_sentinel::config::{Config, LoggingConfig};
use fee_sentinel::sandbox::{serve, SandboxState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "fee-sentinel-sandbox")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "In-memory asset-management API for local testing")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    // The server is quiet at "warn"; keep startup lines visible
    let logging = LoggingConfig {
        level: if config.logging.level.eq_ignore_ascii_case("warn") {
            "info".to_string()
        } else {
            config.logging.level.clone()
        },
        ..config.logging.clone()
    };
    fee_sentinel::logging::init(&logging);

    tracing::info!(
        "Starting Fee Sentinel sandbox v{}",
        env!("CARGO_PKG_VERSION")
    );

    let sandbox = config.sandbox.sandbox_config();
    tracing::info!("Bearer token required: {}", sandbox.require_auth);
    tracing::info!("Detection threshold: |z| >= {}", sandbox.z_threshold);

    let state = Arc::new(SandboxState::seeded(sandbox));
    serve(state).await?;

    tracing::info!("Sandbox stopped");
    Ok(())
}
