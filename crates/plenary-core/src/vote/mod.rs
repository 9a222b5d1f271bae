//! One-vote-per-device voting flow.
//!
//! [`state`] holds the pure state machine; [`VoteSession`] drives it against
//! a [`PollGateway`](crate::poll::PollGateway).

mod session;
pub mod state;

pub use session::VoteSession;
pub use state::{transition, FlowError, VoteEvent, VoteFlow, VoteState};
