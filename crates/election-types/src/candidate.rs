//! Candidate records and generation bookkeeping types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::CandidateId;

/// A candidate as produced by the factory, before the store assigns
/// identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct CandidateDraft {
    /// Full display name ("First Last").
    pub name: String,
    /// Profile image URL.
    pub image: String,
    /// Party affiliation label.
    pub party: String,
    /// Free-text biography and policy focus.
    pub description: String,
}

/// A candidate as persisted by the store gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Candidate {
    /// Store-assigned identifier.
    pub id: CandidateId,
    /// Full display name.
    pub name: String,
    /// Profile image URL.
    pub image: String,
    /// Party affiliation label.
    pub party: String,
    /// Free-text biography and policy focus.
    pub description: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// Stamp a draft with a fresh identifier and the given creation time.
    pub fn from_draft(draft: CandidateDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: CandidateId::new(),
            name: draft.name,
            image: draft.image,
            party: draft.party,
            description: draft.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Point-in-time generation status of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationStatus {
    /// Whether a production timer is currently scheduled.
    pub is_generating: bool,
    /// Candidates produced by the connection's current (or last) run.
    pub generated_count: u64,
}

impl GenerationStatus {
    /// Status of a connection that never started generating.
    pub const IDLE: Self = Self {
        is_generating: false,
        generated_count: 0,
    };
}

/// Aggregate generation figures across every tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GenerationStats {
    /// Connections with a live production timer.
    pub active_generations: u64,
    /// Sum of produced counts over every tracked connection.
    pub total_generated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_uses_camel_case_timestamps() {
        let draft = CandidateDraft {
            name: String::from("Sarah Johnson"),
            image: String::from("https://example.com/a.jpg"),
            party: String::from("Unity Party"),
            description: String::from("Teacher."),
        };
        let candidate = Candidate::from_draft(draft, Utc::now());
        let value = serde_json::to_value(&candidate).unwrap_or_default();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert_eq!(
            value.get("name").and_then(|v| v.as_str()),
            Some("Sarah Johnson")
        );
    }

    #[test]
    fn idle_status_is_default() {
        assert_eq!(GenerationStatus::IDLE, GenerationStatus::default());
    }
}
