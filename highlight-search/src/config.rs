//! Orchestrator configuration with sensible defaults.
//!
//! [`OrchestratorConfig`] is handed to the orchestrator at construction.
//! The core never reads the environment or files; callers build this
//! value from wherever their settings live.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::SearchError;
use crate::types::PlatformId;

/// Fixed-window admission limits for one platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Calls admitted per window.
    pub max_calls_per_window: u32,
    /// Window length.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_calls_per_window: u32, window: Duration) -> Self {
        Self {
            max_calls_per_window,
            window,
        }
    }

    fn validate(&self, label: &str) -> Result<(), SearchError> {
        if self.max_calls_per_window == 0 {
            return Err(SearchError::Config(format!(
                "{label}: max_calls_per_window must be greater than 0"
            )));
        }
        if self.window.is_zero() {
            return Err(SearchError::Config(format!(
                "{label}: window must be greater than 0"
            )));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls_per_window: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Configuration for a [`crate::SearchOrchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Deadline for each individual platform call.
    pub call_timeout: Duration,
    /// Result limit used by [`crate::SearchOrchestrator::query`].
    pub default_limit: usize,
    /// Limits for platforms without an entry in `rate_limits`.
    pub default_rate_limit: RateLimitConfig,
    /// Per-platform limit overrides.
    pub rate_limits: HashMap<PlatformId, RateLimitConfig>,
    /// How long successful per-platform results stay cached in memory.
    /// Zero disables caching.
    pub cache_ttl: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(8),
            default_limit: 5,
            default_rate_limit: RateLimitConfig::default(),
            rate_limits: HashMap::new(),
            cache_ttl: Duration::ZERO,
        }
    }
}

impl OrchestratorConfig {
    /// The limits that apply to `platform`.
    pub fn rate_limit_for(&self, platform: &PlatformId) -> RateLimitConfig {
        self.rate_limits
            .get(platform)
            .copied()
            .unwrap_or(self.default_rate_limit)
    }

    /// Set a per-platform rate limit.
    pub fn with_rate_limit(mut self, platform: PlatformId, limit: RateLimitConfig) -> Self {
        self.rate_limits.insert(platform, limit);
        self
    }

    /// Validates this configuration.
    ///
    /// Checks:
    /// - `call_timeout` must be greater than 0
    /// - `default_limit` must be greater than 0
    /// - every rate limit must admit at least one call over a non-empty window
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.call_timeout.is_zero() {
            return Err(SearchError::Config(
                "call_timeout must be greater than 0".into(),
            ));
        }
        if self.default_limit == 0 {
            return Err(SearchError::Config(
                "default_limit must be greater than 0".into(),
            ));
        }
        self.default_rate_limit.validate("default rate limit")?;
        for (platform, limit) in &self.rate_limits {
            limit.validate(platform.as_str())?;
        }
        Ok(())
    }
}
