//! Public poll REST client.
//!
//! Uses reqwest to call the legislature API's `/polls/public` endpoints.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::error::{server_error, vote_rejection, PollError, GENERIC_SERVER_MESSAGE};
use super::gateway::PollGateway;
use super::types::{AlternativeId, Envelope, Poll, PollId, VoteAck, VoteRequest, VoteStatus};
use crate::config::ApiConfig;

/// Configuration for connecting to the legislature API.
#[derive(Debug, Clone)]
pub struct PollClientConfig {
    /// API base URL (e.g., "<https://api.camara.example>").
    pub base_url: String,
    /// Fixed per-request timeout.
    pub timeout: Duration,
}

impl From<&ApiConfig> for PollClientConfig {
    fn from(api: &ApiConfig) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
        }
    }
}

/// Public poll REST client.
#[derive(Debug, Clone)]
pub struct PollClient {
    http: reqwest::Client,
    base_url: String,
}

impl PollClient {
    /// Create a new poll API client.
    pub fn new(config: &PollClientConfig) -> Result<Self, PollError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(PollError::Config("base_url is empty".into()));
        }
        let parsed = Url::parse(&base_url)
            .map_err(|e| PollError::Config(format!("Invalid base_url {base_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PollError::Config(format!(
                "Unsupported scheme {} in base_url",
                parsed.scheme()
            )));
        }
        if config.timeout.is_zero() {
            return Err(PollError::Config("timeout must be non-zero".into()));
        }

        // Ensure a TLS crypto provider is installed (reqwest uses rustls-no-provider).
        // The `Err` case just means it was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PollError::Config(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    /// Build the full URL for an API path.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, PollError> {
        Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| PollError::Config(format!("Invalid request URL for {path}: {e}")))
    }

    /// Read a `{ success, data }` envelope from a response.
    async fn read_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, PollError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Poll API response");
        if !status.is_success() {
            return Err(server_error(status.as_u16(), &body));
        }
        decode_envelope(status.as_u16(), &body)
    }

    /// `check-vote` without the fail-open policy applied.
    pub async fn check_vote(&self, poll_id: PollId, device_id: &str) -> Result<bool, PollError> {
        let mut url = self.api_url(&format!("/polls/public/{poll_id}/check-vote"))?;
        url.query_pairs_mut().append_pair("device", device_id);
        debug!(poll_id, "GET check-vote");
        let resp = self.http.get(url).send().await?;
        let status: VoteStatus = Self::read_envelope(resp).await?;
        Ok(status.already_voted)
    }
}

/// Decode a 2xx body, treating `success == false` as a server error.
pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<T, PollError> {
    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(|e| PollError::Server {
        status,
        message: format!("Malformed response body: {e}"),
    })?;
    if !envelope.success {
        return Err(PollError::Server {
            status,
            message: envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| GENERIC_SERVER_MESSAGE.to_string()),
        });
    }
    envelope.data.ok_or_else(|| PollError::Server {
        status,
        message: "Response envelope has no data".into(),
    })
}

/// Read a 2xx vote response. The backend has counted the vote at this point,
/// so a missing or unreadable acknowledgement is not an error. Only an
/// explicit `success: false` is treated as a rejection.
pub(crate) fn decode_vote_ack(status: u16, body: &[u8]) -> Result<VoteAck, PollError> {
    let Ok(envelope) = serde_json::from_slice::<Envelope<VoteAck>>(body) else {
        debug!(status, "Vote acknowledged without a readable body");
        return Ok(VoteAck::default());
    };
    if !envelope.success {
        return Err(vote_rejection(status, body));
    }
    Ok(envelope.data.unwrap_or_else(|| VoteAck {
        message: envelope.message.unwrap_or_default(),
    }))
}

fn normalized(mut poll: Poll) -> Poll {
    if let Some(reported) = poll.normalize_total() {
        warn!(
            poll_id = poll.id,
            reported,
            counted = poll.total_votes,
            "Backend total disagrees with alternative tallies, using the sum"
        );
    }
    poll
}

impl PollGateway for PollClient {
    async fn list_active_polls(&self) -> Result<Vec<Poll>, PollError> {
        let mut url = self.api_url("/polls/public")?;
        url.query_pairs_mut().append_pair("active", "true");
        debug!("GET active polls");
        let resp = self.http.get(url).send().await?;
        let polls: Vec<Poll> = Self::read_envelope(resp).await?;
        Ok(polls.into_iter().map(normalized).collect())
    }

    async fn get_poll(&self, poll_id: PollId) -> Result<Poll, PollError> {
        let url = self.api_url(&format!("/polls/public/{poll_id}"))?;
        debug!(poll_id, "GET poll");
        let resp = self.http.get(url).send().await?;
        let poll: Poll = Self::read_envelope(resp).await?;
        Ok(normalized(poll))
    }

    async fn has_voted(&self, poll_id: PollId, device_id: &str) -> bool {
        match self.check_vote(poll_id, device_id).await {
            Ok(voted) => voted,
            Err(e) => {
                warn!(poll_id, error = %e, "Vote check failed, assuming not voted");
                false
            }
        }
    }

    async fn submit_vote(
        &self,
        poll_id: PollId,
        alternative_id: AlternativeId,
        device_id: &str,
    ) -> Result<VoteAck, PollError> {
        let url = self.api_url(&format!("/polls/public/{poll_id}/vote"))?;
        let body = VoteRequest {
            alternative_id,
            device: device_id.to_string(),
        };
        debug!(poll_id, alternative_id, "POST vote");
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let err = vote_rejection(status.as_u16(), &bytes);
            warn!(poll_id, status = status.as_u16(), error = %err, "Vote rejected");
            return Err(err);
        }
        let ack = decode_vote_ack(status.as_u16(), &bytes)?;
        info!(poll_id, alternative_id, "Vote recorded");
        Ok(ack)
    }
}
