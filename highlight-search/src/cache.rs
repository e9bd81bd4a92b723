//! In-memory cache for per-platform search results.
//!
//! Caches each platform's successful record list keyed by the
//! (platform, lowercased query text, limit) triple. Uses [`moka`] for
//! async-friendly caching with a TTL and automatic eviction. Nothing is
//! written outside the process.

use std::time::Duration;

use moka::future::Cache;

use crate::types::{HighlightRecord, PlatformId};

/// Maximum number of cached record lists.
const MAX_CACHE_ENTRIES: u64 = 256;

/// Composite cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    platform: PlatformId,
    /// Lowercased, trimmed query text.
    text: String,
    limit: usize,
}

impl CacheKey {
    /// Build a deterministic cache key. Query text is case-folded.
    pub fn new(platform: &PlatformId, text: &str, limit: usize) -> Self {
        Self {
            platform: platform.clone(),
            text: text.trim().to_lowercase(),
            limit,
        }
    }
}

/// Result cache owned by one orchestrator.
#[derive(Clone)]
pub struct ResultCache {
    inner: Cache<CacheKey, Vec<HighlightRecord>>,
}

impl ResultCache {
    /// Create a cache whose entries expire after `ttl`.
    ///
    /// Returns `None` for a zero TTL, which disables caching.
    pub fn new(ttl: Duration) -> Option<Self> {
        if ttl.is_zero() {
            return None;
        }
        let inner = Cache::builder()
            .max_capacity(MAX_CACHE_ENTRIES)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Some(Self { inner })
    }

    /// Look up cached records. Returns `None` on a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<Vec<HighlightRecord>> {
        self.inner.get(key).await
    }

    /// Store a platform's records.
    pub async fn insert(&self, key: CacheKey, records: Vec<HighlightRecord>) {
        self.inner.insert(key, records).await;
    }

    /// Drop every cached entry for `platform`.
    pub fn invalidate_platform(&self, platform: &PlatformId) {
        let platform = platform.clone();
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.platform == platform)
        {
            tracing::warn!(error = %e, "cache invalidation failed");
        }
    }
}
