//! Drives a [`VoteFlow`] against a [`PollGateway`].
//!
//! Requests are strictly sequential: the vote check completes before
//! selection opens, and the submit completes before the results re-fetch.

use tracing::{info, warn};

use super::state::{FlowError, VoteEvent, VoteFlow, VoteState};
use crate::poll::{AlternativeId, Poll, PollError, PollGateway};
use crate::results::PollResults;

/// One poll-voting session for one device.
pub struct VoteSession<'g, G: PollGateway> {
    gateway: &'g G,
    device_id: String,
    flow: VoteFlow,
}

impl<'g, G: PollGateway> VoteSession<'g, G> {
    pub const fn new(gateway: &'g G, poll: Poll, device_id: String) -> Self {
        Self {
            gateway,
            device_id,
            flow: VoteFlow::new(poll),
        }
    }

    pub const fn state(&self) -> &VoteState {
        self.flow.state()
    }

    pub const fn poll(&self) -> &Poll {
        self.flow.poll()
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub const fn results(&self) -> Option<&PollResults> {
        match self.flow.state() {
            VoteState::ShowingResults { results } => Some(results),
            _ => None,
        }
    }

    /// Check whether this device already voted and move to either results or
    /// selection. A failed check is treated as "not voted".
    pub async fn start(&mut self) -> Result<&VoteState, FlowError> {
        if !matches!(self.flow.state(), VoteState::Checking) {
            return Err(FlowError::InvalidTransition {
                state: self.flow.state().name(),
                event: "start",
            });
        }
        let poll_id = self.flow.poll().id;
        let already_voted = self.gateway.has_voted(poll_id, &self.device_id).await;
        self.flow.apply(VoteEvent::VoteChecked { already_voted })?;

        if already_voted {
            info!(poll_id, "Device already voted, showing results");
            self.load_results().await?;
        } else {
            self.flow.apply(VoteEvent::BeginSelection)?;
        }
        Ok(self.flow.state())
    }

    pub fn select(&mut self, alternative: AlternativeId) -> Result<&VoteState, FlowError> {
        self.flow.apply(VoteEvent::Select(alternative))
    }

    /// Move to the confirmation step. Fails locally with
    /// [`FlowError::NoSelection`] when nothing is selected.
    pub fn request_confirmation(&mut self) -> Result<&VoteState, FlowError> {
        self.flow.apply(VoteEvent::RequestConfirmation)
    }

    pub fn cancel(&mut self) -> Result<&VoteState, FlowError> {
        self.flow.apply(VoteEvent::Cancel)
    }

    /// Return from a failed submit to selection. The next [`confirm`] is a
    /// fresh submission.
    ///
    /// [`confirm`]: Self::confirm
    pub fn retry(&mut self) -> Result<&VoteState, FlowError> {
        self.flow.apply(VoteEvent::Retry)
    }

    /// Submit the confirmed vote once, then re-fetch the poll.
    ///
    /// A duplicate-vote rejection still ends in results; the rejection is
    /// returned so it can be shown. Other rejections leave the flow in
    /// [`VoteState::Failed`].
    pub async fn confirm(&mut self) -> Result<&VoteState, FlowError> {
        self.flow.apply(VoteEvent::Confirm)?;
        let VoteState::Submitting { alternative } = *self.flow.state() else {
            return Err(FlowError::InvalidTransition {
                state: self.flow.state().name(),
                event: "confirm",
            });
        };
        let poll_id = self.flow.poll().id;

        match self
            .gateway
            .submit_vote(poll_id, alternative, &self.device_id)
            .await
        {
            Ok(_) => {
                self.flow.apply(VoteEvent::SubmitSucceeded)?;
                self.load_results().await?;
                Ok(self.flow.state())
            }
            Err(e @ PollError::DuplicateVote(_)) => {
                self.flow.apply(VoteEvent::SubmitFailed(e.clone()))?;
                if let Err(refresh) = self.load_results().await {
                    warn!(poll_id, error = %refresh, "Results refresh after duplicate vote failed");
                }
                Err(FlowError::Gateway(e))
            }
            Err(e) => {
                self.flow.apply(VoteEvent::SubmitFailed(e.clone()))?;
                Err(FlowError::Gateway(e))
            }
        }
    }

    /// Re-fetch tallies. Valid once the device has voted, including after a
    /// previous refresh failed.
    pub async fn refresh_results(&mut self) -> Result<&VoteState, FlowError> {
        self.load_results().await?;
        Ok(self.flow.state())
    }

    async fn load_results(&mut self) -> Result<(), FlowError> {
        if !matches!(
            self.flow.state(),
            VoteState::AlreadyVoted | VoteState::Committed { .. } | VoteState::ShowingResults { .. }
        ) {
            return Err(FlowError::InvalidTransition {
                state: self.flow.state().name(),
                event: "refresh-results",
            });
        }
        let fresh = self.gateway.get_poll(self.flow.poll().id).await?;
        self.flow.apply(VoteEvent::ResultsLoaded(fresh))?;
        Ok(())
    }
}
