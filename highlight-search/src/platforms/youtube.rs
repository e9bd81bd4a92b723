//! YouTube Data API v3 adapter for the video platform.
//!
//! A search runs in two steps: `search.list` finds matching video ids,
//! then `videos.list` fetches their snippets and statistics. View count
//! becomes the engagement score. Both steps share the caller's deadline.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::time::Instant;

use crate::error::{PlatformError, SearchError};
use crate::http;
use crate::searcher::PlatformSearcher;
use crate::types::{HighlightRecord, PlatformId, Query};

use super::{search_terms, YOUTUBE};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// The API caps `maxResults` at 50.
const MAX_PAGE_SIZE: usize = 50;

/// Settings for [`YouTubeSearcher`].
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
    api_key: String,
    base_url: String,
    topic_suffix: Option<String>,
}

impl YouTubeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            topic_suffix: None,
        }
    }

    /// Point the adapter at another API root (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Words appended to every query, e.g. `"basketball highlights"`.
    pub fn with_topic_suffix(mut self, suffix: Option<String>) -> Self {
        self.topic_suffix = suffix;
        self
    }
}

/// Video search through the YouTube Data API.
pub struct YouTubeSearcher {
    config: YouTubeConfig,
    client: reqwest::Client,
}

impl YouTubeSearcher {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: YouTubeConfig) -> Result<Self, SearchError> {
        Ok(Self {
            config,
            client: http::build_client()?,
        })
    }

    fn get(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{endpoint}", self.config.base_url))
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("Accept", "application/json")
    }
}

#[async_trait]
impl PlatformSearcher for YouTubeSearcher {
    fn platform(&self) -> PlatformId {
        PlatformId::new(YOUTUBE)
    }

    async fn search(
        &self,
        query: &Query,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<HighlightRecord>, PlatformError> {
        let deadline = Instant::now() + timeout;
        let terms = search_terms(query.text(), self.config.topic_suffix.as_deref());
        tracing::trace!(query = %terms, "YouTube search");

        let page_size = limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let request = self.get("search").query(&[
            ("part", "snippet"),
            ("type", "video"),
            ("q", terms.as_str()),
            ("maxResults", page_size.as_str()),
            ("order", "date"),
            ("videoDefinition", "high"),
            ("relevanceLanguage", "en"),
            ("safeSearch", "none"),
        ]);
        let found: SearchListResponse = http::send_json(YOUTUBE, request, remaining(deadline)?).await?;

        let ids: Vec<String> = found
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .take(limit)
            .collect();
        if ids.is_empty() {
            tracing::debug!("no YouTube videos found");
            return Ok(Vec::new());
        }

        let joined = ids.join(",");
        let request = self
            .get("videos")
            .query(&[("part", "snippet,statistics"), ("id", joined.as_str())]);
        let details: VideoListResponse = http::send_json(YOUTUBE, request, remaining(deadline)?).await?;

        let records = parse_videos(details, limit);
        tracing::debug!(count = records.len(), "YouTube results parsed");
        Ok(records)
    }
}

/// Time left before `deadline`, or an unavailable error once it has passed.
fn remaining(deadline: Instant) -> Result<Duration, PlatformError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        return Err(PlatformError::unavailable("timeout"));
    }
    Ok(left)
}

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    #[serde(default)]
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(self) -> Option<String> {
        self.high.or(self.medium).or(self.default).map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Counts arrive as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
}

/// Turn a `videos.list` response into records.
///
/// Items that cannot form a valid record are skipped.
fn parse_videos(response: VideoListResponse, limit: usize) -> Vec<HighlightRecord> {
    let platform = PlatformId::new(YOUTUBE);
    let mut records = Vec::new();

    for item in response.items {
        let url = format!("https://www.youtube.com/watch?v={}", item.id);
        let views = item
            .statistics
            .view_count
            .and_then(|count| count.parse::<u64>().ok())
            .map(|count| count as f64);

        match HighlightRecord::new(platform.clone(), item.id, item.snippet.title, url) {
            Ok(record) => records.push(
                record
                    .with_published_at(item.snippet.published_at)
                    .with_engagement_score(views)
                    .with_thumbnail_url(item.snippet.thumbnails.best()),
            ),
            Err(e) => tracing::warn!(error = %e, "skipping YouTube item"),
        }

        if records.len() >= limit {
            break;
        }
    }

    records
}
