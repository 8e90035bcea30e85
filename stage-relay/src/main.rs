//! stage-relay binary entry point.
//!
//! Usage:
//! ```bash
//! stage-relay --config relay.toml
//! stage-relay --help
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use stage_relay::{http, Config, StageRelay};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Staging relay for sealed, signed clipboard entries.
#[derive(Parser)]
#[command(name = "stage-relay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the relay configuration file
    #[arg(short, long, default_value = "relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)?;
    config.validate()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = config.listen_addr()?.to_string();
    let relay = Arc::new(StageRelay::from_config(config).context("failed to initialize relay")?);

    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(
        "stage-relay v{} listening on {}",
        env!("CARGO_PKG_VERSION"),
        listener.local_addr()?
    );

    http::serve(relay, listener, shutdown_signal()).await?;
    tracing::info!("stage-relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
