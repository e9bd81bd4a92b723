//! Platform adapter implementations.
//!
//! Each module provides a struct implementing [`crate::PlatformSearcher`]
//! on top of a platform's authenticated search API.

pub mod twitter;
pub mod youtube;

pub use twitter::{TwitterConfig, TwitterSearcher};
pub use youtube::{YouTubeConfig, YouTubeSearcher};

/// Identifier of the social-post platform.
pub const TWITTER: &str = "twitter";
/// Identifier of the video platform.
pub const YOUTUBE: &str = "youtube";

/// Join the user's text with an adapter's topic suffix.
pub(crate) fn search_terms(text: &str, topic_suffix: Option<&str>) -> String {
    match topic_suffix.map(str::trim) {
        Some(suffix) if !suffix.is_empty() => format!("{text} {suffix}"),
        _ => text.to_string(),
    }
}
