//! Shared type definitions for the Election Live service.
//!
//! Types defined here flow downstream to `TypeScript` via `ts-rs` so the
//! dashboard and the server agree on the WebSocket wire format.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for connections and candidates
//! - [`candidate`] -- Candidate records plus generation status/stats
//! - [`messages`] -- Inbound control messages and outbound event frames

pub mod candidate;
pub mod ids;
pub mod messages;

// Re-export all public types at crate root for convenience.
pub use candidate::{Candidate, CandidateDraft, GenerationStats, GenerationStatus};
pub use ids::{CandidateId, ConnectionId};
pub use messages::{
    CandidateGenerated, ClientMessage, Connected, GenerationError, GenerationStarted,
    GenerationStatusNotice, GenerationStopped, ServerMessage, UnknownMessage,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the wire types.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::ConnectionId::export_all();
        let _ = crate::ids::CandidateId::export_all();
        let _ = crate::candidate::Candidate::export_all();
        let _ = crate::candidate::GenerationStatus::export_all();
        let _ = crate::candidate::GenerationStats::export_all();
        let _ = crate::messages::ClientMessage::export_all();
        let _ = crate::messages::ServerMessage::export_all();
    }
}
