//! Shared application state for the Election Live server.
//!
//! [`AppState`] is wrapped in an [`Arc`](std::sync::Arc) and injected into
//! every handler through Axum's `State` extractor.

use chrono::{DateTime, Utc};

use crate::coordinator::Coordinator;

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Generation coordinator shared by every socket task.
    pub coordinator: Coordinator,
    /// When the state was built; reported by the health endpoint.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wrap a coordinator.
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }
}
