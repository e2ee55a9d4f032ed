//! HTTP server lifecycle.
//!
//! [`start_server`] binds the configured address; [`serve`] runs the router
//! on an already bound listener until the shutdown future resolves, then
//! drains in-flight requests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use election_core::config::ServerSection;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Listener settings for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on. `0` picks a free port.
    pub port: u16,
    /// Origin granted CORS access.
    pub client_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServerSection::default())
    }
}

impl From<&ServerSection> for ServerConfig {
    fn from(section: &ServerSection) -> Self {
        Self {
            host: section.host.clone(),
            port: section.port,
            client_origin: section.client_origin.clone(),
        }
    }
}

impl ServerConfig {
    /// The socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if host and port do not form an
    /// address.
    pub fn addr(&self) -> Result<SocketAddr, ServerError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {}:{}: {e}", self.host, self.port)))
    }

    /// Bind a listener on [`addr`](Self::addr).
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is invalid or taken.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.addr()?;
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
    }
}

/// Bind and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = config.bind().await?;
    serve(listener, &config.client_origin, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] if the server hits a fatal I/O error.
pub async fn serve<F>(
    listener: TcpListener,
    client_origin: &str,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_router(state, client_origin);

    if let Ok(addr) = listener.local_addr() {
        info!(%addr, client_origin, "Election Live server listening");
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    info!("Election Live server stopped");
    Ok(())
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
