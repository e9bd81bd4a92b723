//! Shared HTTP plumbing for platform adapters.
//!
//! Provides a configured [`reqwest::Client`] and the mapping from HTTP
//! failures onto the [`ErrorKind`](crate::ErrorKind) taxonomy, so every
//! adapter classifies transport errors the same way.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::{PlatformError, SearchError};

/// User-Agent sent with every API request.
const USER_AGENT: &str = concat!("highlight-search/", env!("CARGO_PKG_VERSION"));

/// Upper bound on connection establishment, independent of call deadlines.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a [`reqwest::Client`] for platform API calls.
///
/// Per-request deadlines are set by each adapter from the orchestrator's
/// call timeout, so the client itself carries only a connect timeout.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client() -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Classify a transport-level failure (no HTTP response was received).
///
/// The request URL is stripped from the message because it may carry
/// credentials in its query string.
pub fn classify_transport(platform: &str, err: reqwest::Error) -> PlatformError {
    let err = err.without_url();
    if err.is_timeout() {
        PlatformError::unavailable("timeout")
    } else if err.is_decode() {
        PlatformError::malformed(format!("{platform} response could not be decoded: {err}"))
    } else {
        PlatformError::unavailable(format!("{platform} request failed: {err}"))
    }
}

/// Classify a non-success HTTP status.
///
/// `body` is inspected for quota wording, because some backends answer
/// an exhausted quota with 403 rather than 429.
pub fn classify_status(platform: &str, status: StatusCode, body: &str) -> PlatformError {
    let lowered = body.to_lowercase();
    let mentions_quota = ["quota", "ratelimit", "rate limit", "usage cap"]
        .iter()
        .any(|needle| lowered.contains(needle));

    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            PlatformError::throttled(format!("{platform} rate limit exceeded"))
        }
        StatusCode::FORBIDDEN if mentions_quota => {
            PlatformError::throttled(format!("{platform} quota exceeded"))
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            PlatformError::unauthorized(format!("{platform} rejected the credential ({status})"))
        }
        s if s.is_server_error() => {
            PlatformError::unavailable(format!("{platform} backend error ({status})"))
        }
        _ => PlatformError::unavailable(format!("{platform} rejected the request ({status})")),
    }
}

/// Send a prepared request and decode a JSON body, classifying failures.
pub async fn send_json<T: serde::de::DeserializeOwned>(
    platform: &str,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<T, PlatformError> {
    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_transport(platform, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_status(platform, status, &body));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_transport(platform, e))?;
    tracing::trace!(platform, bytes = bytes.len(), "response received");

    serde_json::from_slice(&bytes)
        .map_err(|e| PlatformError::malformed(format!("{platform} returned unexpected JSON: {e}")))
}
