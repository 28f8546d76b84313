//! # Squelch Server
//!
//! Hosts an in-memory world and routes radio traffic through it over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! # Reads ./squelch.toml if present
//! squelch
//!
//! # Override the listen address
//! SQUELCH_PORT=8080 SQUELCH_HOST=0.0.0.0 RUST_LOG=squelch=info squelch
//!
//! # Send a message
//! curl -X POST localhost:8080/transmit \
//!     -H 'content-type: application/json' \
//!     -d '{"source": 2, "message": "status green", "channel": "cmd"}'
//! ```

mod config;
mod handlers;
mod metrics;
mod world;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "squelch=debug,tenvis_squelch_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::load()?;

    tracing::info!(
        host = %config.listen.host,
        port = config.listen.port,
        channels = config.channels.len(),
        actors = config.actors.len(),
        "Starting Squelch"
    );

    metrics::init_metrics();
    handlers::run_server(config).await
}
