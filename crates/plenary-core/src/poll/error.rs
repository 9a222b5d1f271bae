//! Poll gateway error taxonomy.

use thiserror::Error;

use super::types::ErrorBody;

/// Shown when the backend gave no usable message.
pub const GENERIC_SERVER_MESSAGE: &str = "Could not communicate with the server";

/// Poll gateway errors. None of these are retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// Transport failure or timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response without a recognised rejection, or an unusable body.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The backend already holds a vote from this device for this poll.
    #[error("Duplicate vote: {0}")]
    DuplicateVote(String),

    /// The poll's closing time has passed.
    #[error("Poll closed: {0}")]
    PollClosed(String),

    /// Client construction error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PollError {
    /// Message suitable for showing to the user verbatim.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) => "No response from the server. Check your connection.",
            Self::Server { message, .. }
            | Self::DuplicateVote(message)
            | Self::PollClosed(message)
            | Self::Config(message) => message,
        }
    }

    /// Whether the user may try the same action again.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Server { .. })
    }
}

impl From<reqwest::Error> for PollError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            return Self::Config(e.to_string());
        }
        if e.is_decode() {
            return Self::Server {
                status: e.status().map_or(0, |s| s.as_u16()),
                message: format!("Malformed response body: {e}"),
            };
        }
        Self::Network(e.to_string())
    }
}

fn parse_error_body(body: &[u8]) -> ErrorBody {
    serde_json::from_slice(body).unwrap_or_default()
}

/// Map a non-2xx response to a generic server error, keeping the backend's
/// message when it sent one.
pub(crate) fn server_error(status: u16, body: &[u8]) -> PollError {
    let parsed = parse_error_body(body);
    PollError::Server {
        status,
        message: parsed
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
    }
}

/// Map a non-2xx vote submission response.
///
/// 409 or `code == "ALREADY_VOTED"` is a duplicate vote; 410 or
/// `code == "POLL_CLOSED"` is a closed poll; anything else is a server error.
pub(crate) fn vote_rejection(status: u16, body: &[u8]) -> PollError {
    let parsed = parse_error_body(body);
    let code = parsed.code.as_deref().map(str::to_ascii_uppercase);
    let message = parsed.message.filter(|m| !m.is_empty());

    match (status, code.as_deref()) {
        (_, Some("ALREADY_VOTED")) | (409, _) => PollError::DuplicateVote(
            message.unwrap_or_else(|| "This device has already voted on this poll".into()),
        ),
        (_, Some("POLL_CLOSED")) | (410, _) => {
            PollError::PollClosed(message.unwrap_or_else(|| "This poll is closed".into()))
        }
        _ => PollError::Server {
            status,
            message: message.unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
        },
    }
}
