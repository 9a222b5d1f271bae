//! Vote flow states and the pure transition function.

use thiserror::Error;
use tracing::debug;

use crate::poll::{AlternativeId, Poll, PollError, PollId};
use crate::results::{compute_results, PollResults};

/// Where a single poll-voting session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum VoteState {
    /// Asking the backend whether this device already voted.
    Checking,
    NotVoted,
    AlreadyVoted,
    /// Picking an alternative; the choice is revisable.
    Selecting { selected: Option<AlternativeId> },
    /// Waiting for the user to acknowledge the irrevocable vote.
    Confirming { alternative: AlternativeId },
    /// Vote request in flight.
    Submitting { alternative: AlternativeId },
    /// Backend accepted the vote; results not yet re-fetched.
    Committed { alternative: AlternativeId },
    Failed {
        alternative: AlternativeId,
        error: PollError,
    },
    /// Terminal: tallies as last fetched from the backend.
    ShowingResults { results: PollResults },
}

impl VoteState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::NotVoted => "not-voted",
            Self::AlreadyVoted => "already-voted",
            Self::Selecting { .. } => "selecting",
            Self::Confirming { .. } => "confirming",
            Self::Submitting { .. } => "submitting",
            Self::Committed { .. } => "committed",
            Self::Failed { .. } => "failed",
            Self::ShowingResults { .. } => "showing-results",
        }
    }
}

/// Inputs to the vote flow, from the user or from completed requests.
#[derive(Debug, Clone)]
pub enum VoteEvent {
    VoteChecked { already_voted: bool },
    BeginSelection,
    Select(AlternativeId),
    RequestConfirmation,
    Cancel,
    Confirm,
    SubmitSucceeded,
    SubmitFailed(PollError),
    Retry,
    ResultsLoaded(Poll),
}

impl VoteEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VoteChecked { .. } => "vote-checked",
            Self::BeginSelection => "begin-selection",
            Self::Select(_) => "select",
            Self::RequestConfirmation => "request-confirmation",
            Self::Cancel => "cancel",
            Self::Confirm => "confirm",
            Self::SubmitSucceeded => "submit-succeeded",
            Self::SubmitFailed(_) => "submit-failed",
            Self::Retry => "retry",
            Self::ResultsLoaded(_) => "results-loaded",
        }
    }
}

/// Vote flow errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowError {
    #[error("Please select an alternative")]
    NoSelection,

    #[error("Alternative {0} is not part of this poll")]
    UnknownAlternative(AlternativeId),

    #[error("Voting on this poll is no longer possible")]
    RetryNotAllowed,

    #[error("Cannot handle {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    #[error("Received poll {actual} in a session for poll {expected}")]
    PollMismatch { expected: PollId, actual: PollId },

    #[error(transparent)]
    Gateway(#[from] PollError),
}

/// Compute the next state. Performs no I/O and never mutates its inputs.
pub fn transition(
    state: &VoteState,
    poll: &Poll,
    event: &VoteEvent,
) -> Result<VoteState, FlowError> {
    use VoteEvent as E;
    use VoteState as S;

    let invalid = || FlowError::InvalidTransition {
        state: state.name(),
        event: event.name(),
    };

    match (state, event) {
        (S::Checking, E::VoteChecked { already_voted: true }) => Ok(S::AlreadyVoted),
        (S::Checking, E::VoteChecked { already_voted: false }) => Ok(S::NotVoted),

        (S::NotVoted, E::BeginSelection) => Ok(S::Selecting { selected: None }),

        (S::Selecting { .. }, E::Select(id)) => {
            if poll.alternative(*id).is_none() {
                return Err(FlowError::UnknownAlternative(*id));
            }
            Ok(S::Selecting { selected: Some(*id) })
        }
        (S::Selecting { selected: None }, E::RequestConfirmation) => Err(FlowError::NoSelection),
        (S::Selecting { selected: Some(a) }, E::RequestConfirmation) => {
            Ok(S::Confirming { alternative: *a })
        }

        (S::Confirming { alternative }, E::Cancel) => Ok(S::Selecting {
            selected: Some(*alternative),
        }),
        (S::Confirming { alternative }, E::Confirm) => Ok(S::Submitting {
            alternative: *alternative,
        }),

        (S::Submitting { alternative }, E::SubmitSucceeded) => Ok(S::Committed {
            alternative: *alternative,
        }),
        (S::Submitting { .. }, E::SubmitFailed(PollError::DuplicateVote(_))) => {
            Ok(S::AlreadyVoted)
        }
        (S::Submitting { alternative }, E::SubmitFailed(error)) => Ok(S::Failed {
            alternative: *alternative,
            error: error.clone(),
        }),

        (S::Failed { error: PollError::PollClosed(_), .. }, E::Retry) => {
            Err(FlowError::RetryNotAllowed)
        }
        (S::Failed { alternative, .. }, E::Retry) => Ok(S::Selecting {
            selected: Some(*alternative),
        }),

        (
            S::AlreadyVoted | S::Committed { .. } | S::ShowingResults { .. },
            E::ResultsLoaded(fresh),
        ) => {
            if fresh.id != poll.id {
                return Err(FlowError::PollMismatch {
                    expected: poll.id,
                    actual: fresh.id,
                });
            }
            Ok(S::ShowingResults {
                results: compute_results(fresh),
            })
        }

        _ => Err(invalid()),
    }
}

/// A poll snapshot plus the flow's current state.
#[derive(Debug, Clone)]
pub struct VoteFlow {
    poll: Poll,
    state: VoteState,
}

impl VoteFlow {
    /// Start a flow in [`VoteState::Checking`].
    pub const fn new(poll: Poll) -> Self {
        Self {
            poll,
            state: VoteState::Checking,
        }
    }

    pub const fn state(&self) -> &VoteState {
        &self.state
    }

    /// Latest poll snapshot. Only replaced by a backend re-fetch.
    pub const fn poll(&self) -> &Poll {
        &self.poll
    }

    /// Apply `event`. On error the state is left unchanged.
    pub fn apply(&mut self, event: VoteEvent) -> Result<&VoteState, FlowError> {
        let next = transition(&self.state, &self.poll, &event)?;
        debug!(
            poll_id = self.poll.id,
            from = self.state.name(),
            to = next.name(),
            event = event.name(),
            "Vote flow transition"
        );
        if let VoteEvent::ResultsLoaded(fresh) = event {
            self.poll = fresh;
        }
        self.state = next;
        Ok(&self.state)
    }
}
