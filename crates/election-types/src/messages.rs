//! WebSocket message envelopes.
//!
//! Every frame is a JSON object of the form
//! `{"event": "<kebab-case name>", "data": { ... }}`. Inbound control
//! messages carry no payload; any `data` they include is ignored.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::candidate::{Candidate, GenerationStatus};
use crate::ids::ConnectionId;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Control messages a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "event", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum ClientMessage {
    /// Begin (or restart) periodic candidate generation for the sender.
    StartGeneration,
    /// Stop the sender's generation loop.
    StopGeneration,
    /// Ask for the sender's current generation status.
    GetGenerationStatus,
}

impl ClientMessage {
    /// Wire name of the message.
    pub const fn event_name(self) -> &'static str {
        match self {
            Self::StartGeneration => "start-generation",
            Self::StopGeneration => "stop-generation",
            Self::GetGenerationStatus => "get-generation-status",
        }
    }

    /// Decode a text frame.
    ///
    /// Accepts the JSON envelope or the bare event name.
    pub fn parse(frame: &str) -> Result<Self, UnknownMessage> {
        let trimmed = frame.trim();
        if trimmed.starts_with('{') {
            return serde_json::from_str(trimmed)
                .map_err(|e| UnknownMessage(format!("{trimmed} ({e})")));
        }
        trimmed.parse()
    }
}

impl FromStr for ClientMessage {
    type Err = UnknownMessage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_matches('"') {
            "start-generation" => Ok(Self::StartGeneration),
            "stop-generation" => Ok(Self::StopGeneration),
            "get-generation-status" => Ok(Self::GetGenerationStatus),
            other => Err(UnknownMessage(other.to_owned())),
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_name())
    }
}

/// A frame that is not one of the recognised control messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised control message: {0}")]
pub struct UnknownMessage(pub String);

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Sent once to a client right after its socket is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Connected {
    /// The identifier the server uses for this client.
    pub client_id: ConnectionId,
}

/// Acknowledges `start-generation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationStarted {
    /// Human-readable confirmation.
    pub message: String,
    /// Count at the moment of starting (always zero for a fresh run).
    pub generated_count: u64,
}

/// Acknowledges `stop-generation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationStopped {
    /// Human-readable confirmation.
    pub message: String,
    /// Candidates produced by the run that was stopped.
    pub total_generated: u64,
}

/// Coarse on/off notice broadcast whenever any client starts or stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationStatusNotice {
    /// Whether the originating client is now generating.
    pub is_generating: bool,
    /// The client that changed state.
    pub client_id: ConnectionId,
}

/// Broadcast for every successfully stored candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CandidateGenerated {
    /// The stored candidate.
    pub candidate: Candidate,
    /// The originating client's count after this candidate.
    pub generated_count: u64,
    /// The client whose generation loop produced the candidate.
    pub client_id: ConnectionId,
}

/// Reports a failure to the client it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationError {
    /// Human-readable reason.
    pub message: String,
}

/// Every frame the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// Hello frame carrying the client's id (unicast).
    Connected(Connected),
    /// Start acknowledgement (unicast).
    GenerationStarted(GenerationStarted),
    /// Stop acknowledgement (unicast).
    GenerationStopped(GenerationStopped),
    /// Reply to `get-generation-status` (unicast).
    GenerationStatusResponse(GenerationStatus),
    /// On/off notice (broadcast).
    GenerationStatus(GenerationStatusNotice),
    /// A newly stored candidate (broadcast).
    CandidateGenerated(CandidateGenerated),
    /// Failure report (unicast to origin).
    GenerationError(GenerationError),
}

impl ServerMessage {
    /// Wire name of the message.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::GenerationStarted(_) => "generation-started",
            Self::GenerationStopped(_) => "generation-stopped",
            Self::GenerationStatusResponse(_) => "generation-status-response",
            Self::GenerationStatus(_) => "generation-status",
            Self::CandidateGenerated(_) => "candidate-generated",
            Self::GenerationError(_) => "generation-error",
        }
    }
}
