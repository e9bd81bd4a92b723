//! Error types for the highlight-search crate.
//!
//! Per-platform failures are expressed with the closed [`ErrorKind`]
//! taxonomy and never escape an aggregation. Only boundary problems
//! (an invalid query or configuration) surface as [`SearchError`].
//! No credentials appear in any error message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a single platform's failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Credential missing or rejected. Fatal for the platform until it is
    /// registered again.
    Unauthorized,
    /// Local rate limiter denial or backend-reported throttling. Transient.
    Throttled,
    /// Network error, timeout or backend outage. Transient.
    Unavailable,
    /// The backend answered with data the adapter could not normalise.
    Malformed,
}

impl ErrorKind {
    /// Stable lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Throttled => "throttled",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed",
        }
    }

    /// Whether re-issuing the same query later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled | Self::Unavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a [`crate::PlatformSearcher`].
///
/// Adapters translate every transport or backend specific failure into
/// one of these before it crosses the searcher boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    /// Failure classification.
    pub kind: ErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl PlatformError {
    /// Create a platform error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Malformed, message)
    }
}

/// Errors that fail a whole operation rather than a single platform.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The query was rejected before any dispatch.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid orchestrator or adapter configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Convenience type alias for highlight-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
