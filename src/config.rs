//! Application configuration, loaded from TOML.
//!
//! Every section is `#[serde(default)]`, so a partial (or absent) file
//! yields working defaults. [`AppConfig::orchestrator_config`] converts the
//! file representation into the search core's [`OrchestratorConfig`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use highlight_search::platforms::{TWITTER, YOUTUBE};
use highlight_search::{OrchestratorConfig, PlatformId, RateLimitConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Query defaults and orchestrator timing.
    pub search: SearchConfig,
    /// Fallback admission limit for platforms without their own.
    pub rate_limit: RateLimitSection,
    /// Video platform adapter.
    pub youtube: PlatformSection,
    /// Social-post platform adapter.
    pub twitter: PlatformSection,
}

/// Query defaults and orchestrator timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Results per platform and in the merged output.
    pub limit: usize,
    /// Deadline for each platform call, in seconds.
    pub call_timeout_secs: u64,
    /// In-memory result cache lifetime in seconds. `0` disables the cache.
    pub cache_ttl_secs: u64,
    /// Words appended to every query sent to a platform.
    pub topic_suffix: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            call_timeout_secs: 8,
            cache_ttl_secs: 120,
            topic_suffix: "basketball highlights".to_owned(),
        }
    }
}

/// Fixed-window admission limit as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    /// Calls admitted per window.
    pub max_calls: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_calls: 30,
            window_secs: 60,
        }
    }
}

impl From<RateLimitSection> for RateLimitConfig {
    fn from(section: RateLimitSection) -> Self {
        RateLimitConfig::new(section.max_calls, Duration::from_secs(section.window_secs))
    }
}

/// Per-platform adapter settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    /// Set to `true` to leave the platform out even when credentials exist.
    pub disabled: bool,
    /// API root override (tests and proxies).
    pub base_url: Option<String>,
    /// Admission limit for this platform.
    pub rate_limit: Option<RateLimitSection>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Load the explicit `path`, or the default location if it exists.
    ///
    /// A missing file at the default location yields the defaults; a
    /// missing explicit file is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a file that should be read cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Self::default_config_path();
                if default.is_file() {
                    tracing::debug!(path = %default.display(), "loading config");
                    Self::from_file(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Returns the default config file path: `~/.config/highlights/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("highlights").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("highlights")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/highlights-config/config.toml")
        }
    }

    /// Platforms queried when the user names none, in a stable order.
    pub fn enabled_platforms(&self) -> Vec<PlatformId> {
        [(TWITTER, &self.twitter), (YOUTUBE, &self.youtube)]
            .into_iter()
            .filter(|(_, section)| !section.disabled)
            .map(|(id, _)| PlatformId::new(id))
            .collect()
    }

    /// Build and validate the search core configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout, limit or rate limit is zero.
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig> {
        let mut config = OrchestratorConfig {
            call_timeout: Duration::from_secs(self.search.call_timeout_secs),
            default_limit: self.search.limit,
            default_rate_limit: self.rate_limit.into(),
            cache_ttl: Duration::from_secs(self.search.cache_ttl_secs),
            ..Default::default()
        };
        for (id, section) in [(TWITTER, &self.twitter), (YOUTUBE, &self.youtube)] {
            if let Some(limit) = section.rate_limit {
                config = config.with_rate_limit(PlatformId::new(id), limit.into());
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// The topic suffix, or `None` if it is blank.
    pub fn topic_suffix(&self) -> Option<String> {
        let suffix = self.search.topic_suffix.trim();
        (!suffix.is_empty()).then(|| suffix.to_owned())
    }
}
