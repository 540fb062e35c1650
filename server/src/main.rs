//! Cadenza Server - HTTP front end for MIDI generation models.

use anyhow::Result;
use cadenza_server::{CliArgs, ServerConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let config = ServerConfig::load(&args)?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Cadenza Server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        bind = %config.bind_addr(),
        models_root = %config.models_root.display(),
        save_root = %config.save_root.display(),
        workers = config.max_concurrent_generations,
        cache_capacity = config.cache_capacity,
        "Configuration loaded"
    );

    cadenza_server::run(config).await
}
