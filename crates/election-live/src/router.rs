//! Axum router construction.
//!
//! Assembles the REST routes, the `WebSocket` endpoint and the JSON 404
//! fallback into one [`Router`], with CORS limited to the dashboard origin.

use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router.
///
/// - `GET /ws` -- generation control and candidate stream
/// - `GET /api` -- service info
/// - `GET /api/health` -- liveness
/// - `GET /api/generation/stats` -- generation figures
///
/// `client_origin` is the only origin granted CORS access; `*` grants any.
pub fn build_router(state: Arc<AppState>, client_origin: &str) -> Router {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/api", get(handlers::api_info))
        .route("/api/health", get(handlers::health))
        .route("/api/generation/stats", get(handlers::generation_stats))
        .fallback(handlers::not_found)
        .layer(cors_layer(client_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(client_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if client_origin == "*" {
        return cors.allow_origin(Any);
    }
    match HeaderValue::from_str(client_origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            warn!(client_origin, "invalid CORS origin, cross-origin requests disabled: {e}");
            cors
        }
    }
}
