//! # highlight-search
//!
//! Aggregates short-form video highlights from several independent
//! content platforms into one ranked result set.
//!
//! ## Design
//!
//! - Each platform is reached through the [`PlatformSearcher`] capability
//!   trait; the YouTube and X adapters live in [`platforms`]
//! - A fixed-window [`RateLimiter`] per platform gates every call
//! - Admitted platforms are queried concurrently, each under its own deadline
//! - Results are deduplicated by `(platform, id)` and ranked by a total
//!   order, so output never depends on which platform answered first
//! - Partial success: failed platforms are reported next to the records
//!   of the platforms that answered; only an invalid query fails outright
//!
//! ## Security
//!
//! - Credentials are held by adapters and never appear in errors or logs
//! - Query text is logged only at trace level
//! - No network listeners: this is a library, not a server

pub mod cache;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod orchestrator;
pub mod platforms;
pub mod rate_limit;
pub mod searcher;
pub mod types;

pub use config::{OrchestratorConfig, RateLimitConfig};
pub use error::{ErrorKind, PlatformError, Result, SearchError};
pub use health::{HealthReport, HealthState};
pub use orchestrator::{merge, merge_records, SearchOrchestrator};
pub use rate_limit::{Admission, RateLimiter};
pub use searcher::PlatformSearcher;
pub use types::{AggregatedResult, HighlightRecord, PlatformId, PlatformOutcome, Query};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_rejects_blank_text() {
        let result = Query::new("", 5, vec![PlatformId::new(platforms::YOUTUBE)]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("text"));
    }

    #[test]
    fn orchestrator_rejects_invalid_config() {
        let config = OrchestratorConfig {
            call_timeout: std::time::Duration::ZERO,
            ..Default::default()
        };
        let err = SearchOrchestrator::new(config).err().expect("should fail");
        assert!(err.to_string().contains("call_timeout"));
    }
}
