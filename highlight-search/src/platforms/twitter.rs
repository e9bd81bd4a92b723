//! X (Twitter) API v2 recent-search adapter for the social-post platform.
//!
//! Searches recent posts carrying video, then normalises each post into a
//! highlight. Engagement is likes plus reposts.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{PlatformError, SearchError};
use crate::http;
use crate::searcher::PlatformSearcher;
use crate::types::{HighlightRecord, PlatformId, Query};

use super::{search_terms, TWITTER};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Recent search accepts `max_results` in `10..=100`.
const MIN_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Titles are the post text cut to this many characters.
const TITLE_CHARS: usize = 100;

/// Operators restricting results to English posts with video, excluding reposts.
const QUERY_FILTERS: &str = "has:videos lang:en -is:retweet";

/// Settings for [`TwitterSearcher`].
#[derive(Debug, Clone)]
pub struct TwitterConfig {
    bearer_token: String,
    base_url: String,
    topic_suffix: Option<String>,
}

impl TwitterConfig {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            bearer_token: bearer_token.into(),
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

/// Post search through the X API v2.
pub struct TwitterSearcher {
    config: TwitterConfig,
    client: reqwest::Client,
}

impl TwitterSearcher {
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: TwitterConfig) -> Result<Self, SearchError> {
        Ok(Self {
            config,
            client: http::build_client()?,
        })
    }
}

#[async_trait]
impl PlatformSearcher for TwitterSearcher {
    fn platform(&self) -> PlatformId {
        PlatformId::new(TWITTER)
    }

    async fn search(
        &self,
        query: &Query,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<HighlightRecord>, PlatformError> {
        let terms = format!(
            "{} {QUERY_FILTERS}",
            search_terms(query.text(), self.config.topic_suffix.as_deref())
        );
        tracing::trace!(query = %terms, "Twitter search");

        let page_size = limit.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE).to_string();
        let request = self
            .client
            .get(format!("{}/2/tweets/search/recent", self.config.base_url))
            .bearer_auth(&self.config.bearer_token)
            .query(&[
                ("query", terms.as_str()),
                ("max_results", page_size.as_str()),
                ("tweet.fields", "created_at,public_metrics,entities,attachments"),
                ("expansions", "attachments.media_keys"),
                ("media.fields", "preview_image_url,type"),
            ]);

        let response: SearchResponse = http::send_json(TWITTER, request, timeout).await?;
        let records = parse_posts(response, limit);
        tracing::debug!(count = records.len(), "Twitter results parsed");
        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
    #[serde(default)]
    includes: Includes,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: String,
    #[serde(default)]
    text: String,
    created_at: Option<DateTime<Utc>>,
    public_metrics: Option<PublicMetrics>,
    #[serde(default)]
    entities: Entities,
    #[serde(default)]
    attachments: Attachments,
}

#[derive(Debug, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    retweet_count: u64,
}

#[derive(Debug, Default, Deserialize)]
struct Entities {
    #[serde(default)]
    urls: Vec<UrlEntity>,
}

#[derive(Debug, Deserialize)]
struct UrlEntity {
    expanded_url: Option<String>,
    media_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Attachments {
    #[serde(default)]
    media_keys: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    media: Vec<Media>,
}

#[derive(Debug, Deserialize)]
struct Media {
    media_key: String,
    preview_image_url: Option<String>,
}

/// Turn a recent-search response into records.
///
/// The link prefers the attached media's expanded URL, then any linked
/// URL, then the post's own status page.
fn parse_posts(response: SearchResponse, limit: usize) -> Vec<HighlightRecord> {
    let platform = PlatformId::new(TWITTER);
    let previews: HashMap<&str, &str> = response
        .includes
        .media
        .iter()
        .filter_map(|m| Some((m.media_key.as_str(), m.preview_image_url.as_deref()?)))
        .collect();

    let mut records = Vec::new();
    for post in &response.data {
        let url = post
            .entities
            .urls
            .iter()
            .find(|u| u.media_key.is_some())
            .or_else(|| post.entities.urls.first())
            .and_then(|u| u.expanded_url.clone())
            .unwrap_or_else(|| format!("https://twitter.com/i/web/status/{}", post.id));
        let thumbnail = post
            .attachments
            .media_keys
            .iter()
            .find_map(|key| previews.get(key.as_str()))
            .map(|preview| preview.to_string());
        let score = post
            .public_metrics
            .as_ref()
            .map(|m| (m.like_count + m.retweet_count) as f64);

        match HighlightRecord::new(platform.clone(), post.id.clone(), title_from(&post.text), url)
        {
            Ok(record) => records.push(
                record
                    .with_published_at(post.created_at)
                    .with_engagement_score(score)
                    .with_thumbnail_url(thumbnail),
            ),
            Err(e) => tracing::warn!(error = %e, "skipping Twitter post"),
        }

        if records.len() >= limit {
            break;
        }
    }

    records
}

/// Collapse whitespace and cut the post text to a title.
fn title_from(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= TITLE_CHARS {
        return collapsed;
    }
    let mut title: String = collapsed.chars().take(TITLE_CHARS).collect();
    title.push_str("...");
    title
}
