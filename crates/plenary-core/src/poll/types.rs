//! Public poll wire types.
//!
//! Deserialization structs matching the legislature REST API JSON bodies.
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type PollId = u64;
pub type AlternativeId = u64;

/// Poll lifecycle status, administered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    #[serde(alias = "Active", alias = "ACTIVE", alias = "Ativa")]
    Active,
    #[serde(alias = "Closed", alias = "CLOSED", alias = "Encerrada")]
    Closed,
    #[serde(alias = "Draft", alias = "DRAFT", alias = "Rascunho")]
    Draft,
}

/// One selectable choice within a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alternative {
    pub id: AlternativeId,
    pub text: String,
    #[serde(default)]
    pub vote_count: u64,
}

/// A public survey and its live tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub closing_time: OffsetDateTime,
    pub status: PollStatus,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub total_votes: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Poll {
    /// Sum of all alternatives' vote counts, saturating at `u64::MAX`.
    pub fn counted_votes(&self) -> u64 {
        self.alternatives
            .iter()
            .fold(0u64, |acc, a| acc.saturating_add(a.vote_count))
    }

    /// Force `total_votes` to equal the per-alternative sum.
    ///
    /// Returns the backend-reported total when it disagreed.
    pub fn normalize_total(&mut self) -> Option<u64> {
        let counted = self.counted_votes();
        if self.total_votes == counted {
            return None;
        }
        let reported = self.total_votes;
        self.total_votes = counted;
        Some(reported)
    }

    pub fn alternative(&self, id: AlternativeId) -> Option<&Alternative> {
        self.alternatives.iter().find(|a| a.id == id)
    }

    /// Whether the poll accepts votes at `now` as far as the client can tell.
    /// The backend remains the enforcement point.
    pub fn is_open_at(&self, now: OffsetDateTime) -> bool {
        self.status == PollStatus::Active && now < self.closing_time
    }
}

/// Body of `POST /polls/public/{id}/vote`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub alternative_id: AlternativeId,
    pub device: String,
}

/// Successful vote acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteAck {
    #[serde(default)]
    pub message: String,
}

/// Payload of `GET /polls/public/{id}/check-vote`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub already_voted: bool,
}

/// `{ success, data, message }` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub code: Option<String>,
}
