//! Election Live server binary.
//!
//! Wires configuration, logging, the candidate store gateway, the
//! generation coordinator and the HTTP + `WebSocket` server together, then
//! runs until SIGINT or SIGTERM.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `ELECTION_CONFIG` (default
//!    `election-config.yaml`) plus environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Open the candidate store
//! 4. Build the coordinator and spawn the server
//! 5. On a termination signal, stop every generation run, close every
//!    socket, and let the server drain

mod error;
mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use election_core::config::{LiveConfig, LogFormat, LoggingConfig};
use election_live::{AppState, Coordinator, ServerConfig};
use tokio::sync::oneshot;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const DEFAULT_CONFIG_PATH: &str = "election-config.yaml";

/// How long the server may take to finish in-flight requests after the
/// shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Configuration.
    let config_path = std::env::var_os("ELECTION_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Logging.
    init_logging(&config.logging);
    info!("election-server starting");
    if !config_path.exists() {
        warn!(path = %config_path.display(), "config file not found, using defaults");
    }
    info!(
        host = %config.server.host,
        port = config.server.port,
        client_origin = %config.server.client_origin,
        interval_ms = config.generation.interval_ms,
        outbound_queue = config.generation.outbound_queue,
        "Configuration loaded"
    );

    // 3. Store gateway.
    let store = store::open_store(&config.store)
        .await
        .context("opening candidate store")?;

    // 4. Coordinator and server.
    let coordinator = Coordinator::from_config(&config.generation, store);
    let state = Arc::new(AppState::new(coordinator.clone()));
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = election_live::spawn_server(
        ServerConfig::from(&config.server),
        state,
        async move {
            let _ = stop_rx.await;
        },
    )
    .await
    .context("starting server")?;
    info!(
        addr = %server.addr,
        "API at http://{}/api, WebSocket at ws://{}/ws",
        server.addr,
        server.addr
    );

    // 5. Shutdown.
    shutdown_signal().await;
    info!("Shutdown signal received");

    let stopped = coordinator.shutdown().await;
    info!(stopped, "All generation runs stopped");

    let _ = stop_tx.send(());
    match tokio::time::timeout(DRAIN_TIMEOUT, server.handle).await {
        Ok(Ok(())) => info!("Server closed"),
        Ok(Err(e)) => warn!(error = %e, "Server task failed"),
        Err(_) => warn!(timeout_secs = DRAIN_TIMEOUT.as_secs(), "Server did not drain in time"),
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<LiveConfig, AppError> {
    Ok(LiveConfig::from_file(path)?)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Resolve on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
