//! Live transport for the Election Live service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) where each client starts, stops and
//!   queries its own generation run and receives every client's
//!   generated candidates
//! - **REST endpoints** for service info, health and generation stats
//!
//! # Architecture
//!
//! Each socket registers with the [`ConnectionHub`], which owns one bounded
//! outbound queue per peer. The [`Coordinator`] maps control messages onto
//! the per-connection [`GenerationRegistry`](election_core::GenerationRegistry)
//! and relays tick outcomes back through the hub: successes to everyone,
//! failures to the originating client only.

pub mod coordinator;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use coordinator::{Coordinator, HubRelay, LiveStats};
pub use error::LiveError;
pub use hub::ConnectionHub;
pub use router::build_router;
pub use server::{serve, start_server, ServerConfig, ServerError};
pub use startup::{spawn_server, RunningServer, StartupError};
pub use state::AppState;
