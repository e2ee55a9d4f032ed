//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api` | Service info and WebSocket event names |
//! | `GET` | `/api/health` | Liveness check |
//! | `GET` | `/api/generation/stats` | Active runs, total produced, connected clients |
//!
//! Any other path answers `404` through [`not_found`].

use std::sync::Arc;

use axum::extract::State;
use axum::http::Uri;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::coordinator::LiveStats;
use crate::error::LiveError;
use crate::state::AppState;

/// Service version reported by `/api` and `/api/health`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Event names a WebSocket client can send or receive.
pub const WEBSOCKET_EVENTS: &[&str] = &[
    "start-generation",
    "stop-generation",
    "get-generation-status",
    "connected",
    "generation-started",
    "generation-stopped",
    "generation-status-response",
    "generation-status",
    "candidate-generated",
    "generation-error",
];

/// `GET /api`
pub async fn api_info() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Election Live API",
        "version": VERSION,
        "endpoints": {
            "health": "/api/health",
            "stats": "/api/generation/stats",
            "websocket": "/ws",
        },
        "websocket": {
            "events": WEBSOCKET_EVENTS,
        },
    }))
}

/// `GET /api/health`
///
/// Answers `503` once shutdown has begun so load balancers stop routing
/// new sockets here.
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, LiveError> {
    if state.coordinator.registry().is_shutting_down() {
        return Err(LiveError::Unavailable(String::from("Election Live is shutting down")));
    }

    let uptime_secs = Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);

    Ok(Json(json!({
        "success": true,
        "message": "Election Live is running",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "version": VERSION,
        "uptimeSecs": uptime_secs,
    })))
}

/// `GET /api/generation/stats`
pub async fn generation_stats(State(state): State<Arc<AppState>>) -> Json<LiveStats> {
    Json(state.coordinator.stats().await)
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> LiveError {
    LiveError::NotFound {
        path: uri.path().to_owned(),
    }
}
