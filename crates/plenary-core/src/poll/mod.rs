//! Public poll gateway.
//!
//! Provides a reqwest-based client for the legislature's public poll
//! endpoints, the wire types it exchanges, and the [`PollGateway`] seam the
//! vote flow depends on.

mod client;
mod error;
mod gateway;
pub mod types;


pub use client::{PollClient, PollClientConfig};
pub use error::{PollError, GENERIC_SERVER_MESSAGE};
pub use gateway::PollGateway;
pub use types::{Alternative, AlternativeId, Poll, PollId, PollStatus, VoteAck};
