//! Wires configuration and credentials into a ready search orchestrator.

use std::sync::Arc;

use highlight_search::platforms::{
    TwitterConfig, TwitterSearcher, YouTubeConfig, YouTubeSearcher, TWITTER, YOUTUBE,
};
use highlight_search::{HighlightRecord, PlatformId, Query, SearchOrchestrator};

use crate::config::AppConfig;
use crate::credentials::Credentials;
use crate::error::Result;

/// Build an orchestrator with every enabled platform that has a usable
/// credential registered.
///
/// Platforms left out here are still queryable by name; they report
/// `unavailable: not registered` in the aggregated result.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or an HTTP client
/// cannot be built.
pub fn build_orchestrator(config: &AppConfig, credentials: &Credentials) -> Result<SearchOrchestrator> {
    let mut orchestrator = SearchOrchestrator::new(config.orchestrator_config()?)?;

    match (&credentials.youtube_api_key, config.youtube.disabled) {
        (_, true) => tracing::info!(platform = YOUTUBE, "platform disabled in config"),
        (None, false) => tracing::info!(platform = YOUTUBE, "no usable credential, not registering"),
        (Some(key), false) => {
            let mut adapter =
                YouTubeConfig::new(key.expose()).with_topic_suffix(config.topic_suffix());
            if let Some(base_url) = &config.youtube.base_url {
                adapter = adapter.with_base_url(base_url);
            }
            orchestrator.register(Arc::new(YouTubeSearcher::new(adapter)?));
        }
    }

    match (&credentials.twitter_bearer_token, config.twitter.disabled) {
        (_, true) => tracing::info!(platform = TWITTER, "platform disabled in config"),
        (None, false) => tracing::info!(platform = TWITTER, "no usable credential, not registering"),
        (Some(token), false) => {
            let mut adapter =
                TwitterConfig::new(token.expose()).with_topic_suffix(config.topic_suffix());
            if let Some(base_url) = &config.twitter.base_url {
                adapter = adapter.with_base_url(base_url);
            }
            orchestrator.register(Arc::new(TwitterSearcher::new(adapter)?));
        }
    }

    tracing::debug!(platforms = ?orchestrator.registered_platforms(), "orchestrator ready");
    Ok(orchestrator)
}

/// Build the query for one CLI invocation.
///
/// With no platforms named, every platform enabled in the config is
/// selected, registered or not.
///
/// # Errors
///
/// Returns an error if the text is blank, the limit is zero, or no
/// platform is selected.
pub fn build_query(
    config: &AppConfig,
    text: &str,
    limit: Option<usize>,
    platforms: &[String],
) -> Result<Query> {
    let selected: Vec<PlatformId> = if platforms.is_empty() {
        config.enabled_platforms()
    } else {
        platforms.iter().map(PlatformId::new).collect()
    };
    Ok(Query::new(
        text,
        limit.unwrap_or(config.search.limit),
        selected,
    )?)
}

/// One display line for a record: platform, title, date, URL.
pub fn format_record(record: &HighlightRecord) -> String {
    let date = record
        .published_at()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_owned());
    format!(
        "[{}] {} ({date}) {}",
        record.platform(),
        record.title(),
        record.url()
    )
}
