//! Background server startup.
//!
//! [`spawn_server`] binds eagerly, so an address conflict is reported to
//! the caller instead of being logged from inside a detached task, then
//! runs the server on a background Tokio task.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// A server running on a background task.
#[derive(Debug)]
pub struct RunningServer {
    /// The address actually bound (useful when the configured port is `0`).
    pub addr: SocketAddr,
    /// Completes once the server has drained after shutdown.
    pub handle: JoinHandle<()>,
}

/// Bind `config` and serve on a background task until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot be
/// bound.
pub async fn spawn_server<F>(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<RunningServer, StartupError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = config.bind().await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, &config.client_origin, state, shutdown).await {
            tracing::error!(error = %e, "Election Live server exited with error");
        }
    });

    tracing::info!(%addr, "Election Live server spawned on background task");

    Ok(RunningServer { addr, handle })
}
