//! Clients for the upstream statistics providers
//!
//! Two providers feed the gateway: balldontlie (teams, games, season averages,
//! player bios; needs an API key) and stats.nba.com (shot charts, game logs,
//! play-by-play; unauthenticated but picky about headers). Both are expected to be
//! slow, rate limited, or unreachable on a regular basis.

pub mod balldontlie;
pub mod stats_nba;

pub use balldontlie::BallDontLieClient;
pub use stats_nba::StatsNbaClient;

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use thiserror::Error;

/// Errors that can occur when calling an upstream provider
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The provider did not answer within the configured timeout
    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// The provider is throttling us
    #[error("Rate limit reached for {endpoint}")]
    RateLimited { endpoint: String },

    /// Any other non-success status
    #[error("{endpoint} returned {status}")]
    Status { endpoint: String, status: StatusCode },

    /// Response body was not the JSON we expected
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response parsed but lacked required data
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// No API key configured for a provider that requires one
    #[error("No API key configured for {provider}")]
    MissingCredential { provider: &'static str },
}

impl UpstreamError {
    /// Classifies a transport error, separating timeouts from other failures
    pub(crate) fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else {
            Self::Request(err)
        }
    }

    /// Whether this failure was a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Builds the HTTP client shared by a provider, with a hard request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<Client, UpstreamError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(UpstreamError::Request)
}

/// Turns a non-success status into the matching error
pub(crate) fn check_status(endpoint: &str, response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(UpstreamError::RateLimited {
            endpoint: endpoint.to_string(),
        })
    } else {
        Err(UpstreamError::Status {
            endpoint: endpoint.to_string(),
            status,
        })
    }
}

/// Reads a response body and decodes it as JSON
pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, UpstreamError> {
    let text = response
        .text()
        .await
        .map_err(|err| UpstreamError::from_reqwest(endpoint, err))?;
    Ok(serde_json::from_str(&text)?)
}
