//! Capability interface for pluggable platform backends.
//!
//! Each platform (the social-post search API, the video search API, and
//! any future source) implements [`PlatformSearcher`]. The orchestrator
//! depends only on this trait, so new platforms need no core changes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::types::{HighlightRecord, PlatformId, Query};

/// A platform search backend.
///
/// Implementors own everything wire-related: URL construction, auth
/// headers, response parsing. They must:
///
/// - return at most `limit` records
/// - return `Ok(vec![])` when nothing matches
/// - translate every transport or backend error into a [`PlatformError`]
/// - give up with [`crate::ErrorKind::Unavailable`] once `timeout` elapses
///
/// All implementations must be `Send + Sync` so they can run on worker tasks.
#[async_trait]
pub trait PlatformSearcher: Send + Sync {
    /// The platform this searcher serves. Records it returns must carry
    /// the same identifier.
    fn platform(&self) -> PlatformId;

    /// Search the platform for highlights matching `query`.
    ///
    /// # Errors
    ///
    /// Returns a [`PlatformError`] classified as unauthorized, throttled,
    /// unavailable or malformed.
    async fn search(
        &self,
        query: &Query,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<HighlightRecord>, PlatformError>;
}
