//! `Plenary` Core Library
//!
//! Shared functionality for the `Plenary` public-poll client:
//! - Durable key-value storage for installation-local state
//! - Device identity used to scope one vote per device per poll
//! - Poll REST gateway and vote submission flow
//! - Result aggregation for display
//! - Configuration resolution and common error types

pub mod config;
pub mod device;
pub mod error;
pub mod favorites;
pub mod poll;
pub mod results;
pub mod store;
pub mod tracing_init;
pub mod vote;

pub use config::Config;
pub use device::DeviceIdentity;
pub use error::{Error, Result};
pub use poll::{PollClient, PollError, PollGateway};
pub use vote::{FlowError, VoteFlow, VoteSession, VoteState};
