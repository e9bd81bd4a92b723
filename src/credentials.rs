//! Platform credentials from the process environment or a `.env` file.
//!
//! A credential is usable only when it is present and well-formed:
//! non-empty after trimming and not a `your_...` placeholder left over
//! from a template. Values are only ever logged masked.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::{AppError, Result};

/// Environment variable holding the X API v2 bearer token.
pub const TWITTER_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";
/// Environment variable holding the YouTube Data API key.
pub const YOUTUBE_API_KEY: &str = "YOUTUBE_API_KEY";

const PLACEHOLDER_PREFIX: &str = "your_";

/// A secret value whose `Debug` output is masked.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// The raw value, for handing to an adapter.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", mask(&self.0))
    }
}

/// Credentials for the supported platforms.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub twitter_bearer_token: Option<Secret>,
    pub youtube_api_key: Option<Secret>,
}

impl Credentials {
    /// Load credentials, optionally reading an explicit `.env` file first.
    ///
    /// Values in an explicit file take precedence over the process
    /// environment. Without one, a `.env` in the working directory is
    /// loaded if present and never overrides variables already set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Credentials`] if an explicit file is missing or
    /// cannot be parsed.
    pub fn load(env_file: Option<&Path>) -> Result<Self> {
        match env_file {
            Some(path) => {
                let file = read_env_file(path)?;
                tracing::debug!(path = %path.display(), entries = file.len(), "loaded env file");
                Ok(Self::from_lookup(|name| {
                    file.get(name).cloned().or_else(|| std::env::var(name).ok())
                }))
            }
            None => {
                if let Err(e) = dotenvy::dotenv() {
                    if !e.not_found() {
                        tracing::warn!(error = %e, "ignoring unreadable .env file");
                    }
                }
                Ok(Self::from_lookup(|name| std::env::var(name).ok()))
            }
        }
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            twitter_bearer_token: well_formed(TWITTER_BEARER_TOKEN, lookup(TWITTER_BEARER_TOKEN)),
            youtube_api_key: well_formed(YOUTUBE_API_KEY, lookup(YOUTUBE_API_KEY)),
        }
    }
}

/// Parse a dotenv file into a map without touching the process environment.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = dotenvy::from_path_iter(path)
        .map_err(|e| AppError::Credentials(format!("{}: {e}", path.display())))?;
    iter.map(|entry| {
        entry.map_err(|e| AppError::Credentials(format!("{}: {e}", path.display())))
    })
    .collect()
}

/// Apply the present-and-well-formed gate to one variable.
fn well_formed(name: &str, value: Option<String>) -> Option<Secret> {
    let Some(value) = value else {
        tracing::info!(variable = name, "credential not set");
        return None;
    };
    let value = value.trim();
    if value.is_empty() {
        tracing::warn!(variable = name, "credential is empty");
        return None;
    }
    if value.starts_with(PLACEHOLDER_PREFIX) {
        tracing::warn!(variable = name, "credential looks like a placeholder");
        return None;
    }
    tracing::debug!(variable = name, value = %mask(value), "credential loaded");
    Some(Secret(value.to_owned()))
}

/// Mask all but the last four characters.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "********".to_owned();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("********{tail}")
}
