//! The data-access seam used by the vote flow.

use std::future::Future;

use super::error::PollError;
use super::types::{AlternativeId, Poll, PollId, VoteAck};

/// Remote source of public polls.
///
/// Implementations never retry: every failure is surfaced to the caller on
/// the first attempt.
pub trait PollGateway: Send + Sync {
    /// Polls currently open for voting.
    fn list_active_polls(&self) -> impl Future<Output = Result<Vec<Poll>, PollError>> + Send;

    /// One poll with its live tallies.
    fn get_poll(&self, poll_id: PollId) -> impl Future<Output = Result<Poll, PollError>> + Send;

    /// Whether `device_id` already voted on `poll_id`.
    ///
    /// Fails open: any lookup error yields `false`, since the vote endpoint
    /// rejects duplicates authoritatively.
    fn has_voted(&self, poll_id: PollId, device_id: &str) -> impl Future<Output = bool> + Send;

    /// Submit exactly one vote.
    fn submit_vote(
        &self,
        poll_id: PollId,
        alternative_id: AlternativeId,
        device_id: &str,
    ) -> impl Future<Output = Result<VoteAck, PollError>> + Send;
}
