//! Core types: queries, normalised highlight records and aggregation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use crate::error::{ErrorKind, PlatformError, SearchError};

/// Identifier of one content platform, e.g. `"youtube"`.
///
/// Identifiers are lowercased and trimmed on construction so that
/// `"YouTube"` and `"youtube"` name the same platform. Ordering is
/// lexicographic and is used as the final ranking tie-break.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a normalised platform identifier.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_lowercase())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlatformId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PlatformId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One user search action. Immutable once built.
///
/// Construction validates every field, so a `Query` value that exists is
/// always dispatchable. Duplicate platforms collapse into one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    text: String,
    limit: usize,
    platforms: BTreeSet<PlatformId>,
}

impl Query {
    /// Build a query from user input.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] if the trimmed text is empty,
    /// `limit` is zero, or no platform is named.
    pub fn new(
        text: impl AsRef<str>,
        limit: usize,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Result<Self, SearchError> {
        let query = Self {
            text: text.as_ref().trim().to_string(),
            limit,
            platforms: platforms.into_iter().collect(),
        };
        query.validate()?;
        Ok(query)
    }

    /// Check the query invariants.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.text.is_empty() {
            return Err(SearchError::InvalidQuery("text must not be empty".into()));
        }
        if self.limit == 0 {
            return Err(SearchError::InvalidQuery(
                "limit must be greater than 0".into(),
            ));
        }
        if self.platforms.is_empty() {
            return Err(SearchError::InvalidQuery(
                "at least one platform must be selected".into(),
            ));
        }
        Ok(())
    }

    /// The trimmed search text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Maximum number of records in the aggregated result.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The deduplicated set of platforms to query, in identifier order.
    pub fn platforms(&self) -> &BTreeSet<PlatformId> {
        &self.platforms
    }
}

/// A single highlight normalised from any platform.
///
/// `(platform, id)` identifies a record. Fields are read-only once an
/// adapter has built the record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightRecord {
    platform: PlatformId,
    id: String,
    title: String,
    url: String,
    published_at: Option<DateTime<Utc>>,
    engagement_score: Option<f64>,
    thumbnail_url: Option<String>,
}

impl HighlightRecord {
    /// Build a record with its required fields.
    ///
    /// # Errors
    ///
    /// Returns a [`ErrorKind::Malformed`] error if `id` is empty or `url`
    /// is not an absolute URL.
    pub fn new(
        platform: PlatformId,
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, PlatformError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(PlatformError::malformed(format!(
                "{platform} record without an id"
            )));
        }
        let url = url.into();
        // `Url::parse` only accepts absolute URLs.
        url::Url::parse(&url).map_err(|e| {
            PlatformError::malformed(format!("{platform} record {id} has invalid url: {e}"))
        })?;
        Ok(Self {
            platform,
            id,
            title: title.into(),
            url,
            published_at: None,
            engagement_score: None,
            thumbnail_url: None,
        })
    }

    /// Attach the publication time.
    pub fn with_published_at(mut self, published_at: Option<DateTime<Utc>>) -> Self {
        self.published_at = published_at;
        self
    }

    /// Attach an engagement score. Non-finite scores are treated as absent.
    pub fn with_engagement_score(mut self, score: Option<f64>) -> Self {
        self.engagement_score = score.filter(|s| s.is_finite());
        self
    }

    /// Attach a thumbnail URL.
    pub fn with_thumbnail_url(mut self, thumbnail_url: Option<String>) -> Self {
        self.thumbnail_url = thumbnail_url;
        self
    }

    pub fn platform(&self) -> &PlatformId {
        &self.platform
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn engagement_score(&self) -> Option<f64> {
        self.engagement_score
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    /// The deduplication key.
    pub fn key(&self) -> (&PlatformId, &str) {
        (&self.platform, &self.id)
    }
}

/// Result of dispatching one query to one platform.
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformOutcome {
    /// The platform answered; the list may be empty.
    Success(Vec<HighlightRecord>),
    /// The local rate limiter denied the call; the searcher was not contacted.
    RateLimited {
        /// How long until the platform's window reopens.
        retry_after: Duration,
    },
    /// The call failed.
    Failed {
        kind: ErrorKind,
        message: String,
    },
}

impl PlatformOutcome {
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failed {
            kind,
            message: message.into(),
        }
    }

    /// The error kind this outcome reports, or `None` on success.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::RateLimited { .. } => Some(ErrorKind::Throttled),
            Self::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Combined, ranked result of one aggregation.
///
/// Every queried platform appears in exactly one of
/// `succeeded_platforms` or `failed_platforms`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedResult {
    /// Ranked, deduplicated records, at most `Query::limit` long.
    pub records: Vec<HighlightRecord>,
    /// Platforms that answered.
    pub succeeded_platforms: BTreeSet<PlatformId>,
    /// Platforms that failed, with the failure kind.
    pub failed_platforms: BTreeMap<PlatformId, ErrorKind>,
    /// Detail message for each failed platform.
    pub failure_messages: BTreeMap<PlatformId, String>,
    /// Retry hints for platforms denied by the rate limiter.
    pub retry_after: BTreeMap<PlatformId, Duration>,
}

impl AggregatedResult {
    /// True when at least one platform failed and at least one succeeded.
    pub fn is_partial(&self) -> bool {
        !self.succeeded_platforms.is_empty() && !self.failed_platforms.is_empty()
    }

    /// One short user-facing notice per failed platform, in platform order.
    pub fn notices(&self) -> Vec<String> {
        self.failed_platforms
            .iter()
            .map(|(platform, kind)| match self.retry_after.get(platform) {
                Some(wait) => format!("{platform} {kind}: retry in {}s", wait.as_secs().max(1)),
                None => match self.failure_messages.get(platform) {
                    Some(message) => format!("{platform} {kind}: {message}"),
                    None => format!("{platform} {kind}"),
                },
            })
            .collect()
    }
}
