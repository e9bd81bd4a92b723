//! Core search orchestrator: admission, concurrent fan-out, partition, rank.
//!
//! One [`SearchOrchestrator`] owns the registered platform searchers and
//! the process-lifetime state attached to each of them (rate limiter,
//! health tracker). Every platform carries its own locks, so there is no
//! lock shared across platforms.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cache::{CacheKey, ResultCache};
use crate::config::OrchestratorConfig;
use crate::error::{ErrorKind, PlatformError, SearchError};
use crate::health::{HealthReport, HealthTracker};
use crate::rate_limit::{Admission, RateLimiter};
use crate::searcher::PlatformSearcher;
use crate::types::{AggregatedResult, HighlightRecord, PlatformId, PlatformOutcome, Query};

use super::ranking::merge;

/// State kept for one registered platform.
struct Registration {
    searcher: Arc<dyn PlatformSearcher>,
    limiter: Arc<RateLimiter>,
    health: HealthTracker,
}

/// Fans one query out to every selected platform and merges the answers.
pub struct SearchOrchestrator {
    config: OrchestratorConfig,
    platforms: HashMap<PlatformId, Arc<Registration>>,
    cache: Option<ResultCache>,
}

impl SearchOrchestrator {
    /// Create an orchestrator with no registered platforms.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(config: OrchestratorConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let cache = ResultCache::new(config.cache_ttl);
        Ok(Self {
            config,
            platforms: HashMap::new(),
            cache,
        })
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_searcher(mut self, searcher: Arc<dyn PlatformSearcher>) -> Self {
        self.register(searcher);
        self
    }

    /// Register a searcher for its platform, replacing any previous one.
    ///
    /// Re-registering clears the platform's health (including a revoked
    /// credential) and its cached results. The rate-limiter window is kept
    /// so that re-registration cannot be used to bypass the limit.
    pub fn register(&mut self, searcher: Arc<dyn PlatformSearcher>) {
        let platform = searcher.platform();
        let limiter = match self.platforms.get(&platform) {
            Some(previous) => Arc::clone(&previous.limiter),
            None => Arc::new(RateLimiter::new(self.config.rate_limit_for(&platform))),
        };
        if let Some(cache) = &self.cache {
            cache.invalidate_platform(&platform);
        }
        tracing::debug!(%platform, "platform registered");
        self.platforms.insert(
            platform,
            Arc::new(Registration {
                searcher,
                limiter,
                health: HealthTracker::new(),
            }),
        );
    }

    /// Remove a platform. Returns `false` if it was not registered.
    pub fn unregister(&mut self, platform: &PlatformId) -> bool {
        self.platforms.remove(platform).is_some()
    }

    /// Registered platforms in identifier order.
    pub fn registered_platforms(&self) -> Vec<PlatformId> {
        let mut platforms: Vec<PlatformId> = self.platforms.keys().cloned().collect();
        platforms.sort();
        platforms
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Build a query using the configured default limit.
    ///
    /// An empty `platforms` selects every registered platform.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] as [`Query::new`] does.
    pub fn query(
        &self,
        text: &str,
        platforms: impl IntoIterator<Item = PlatformId>,
    ) -> Result<Query, SearchError> {
        let mut selected: Vec<PlatformId> = platforms.into_iter().collect();
        if selected.is_empty() {
            selected = self.registered_platforms();
        }
        Query::new(text, self.config.default_limit, selected)
    }

    /// Run one aggregation.
    ///
    /// # Pipeline
    ///
    /// 1. Validate the query; nothing else happens if it is invalid
    /// 2. Resolve each platform: unregistered and revoked platforms fail
    ///    immediately, cached answers are reused
    /// 3. Ask each remaining platform's rate limiter for admission
    /// 4. Spawn one worker per admitted platform, each under its own deadline
    /// 5. Join every worker; a timeout or panic fails only that platform
    /// 6. Partition outcomes and merge successful records
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] only for an invalid query.
    /// Per-platform failures are reported inside the result.
    pub async fn aggregate(&self, query: &Query) -> Result<AggregatedResult, SearchError> {
        query.validate()?;
        tracing::trace!(query = query.text(), limit = query.limit(), "aggregating");

        let mut outcomes: BTreeMap<PlatformId, PlatformOutcome> = BTreeMap::new();
        let mut workers = Vec::new();

        for platform in query.platforms() {
            let Some(registration) = self.platforms.get(platform) else {
                tracing::debug!(%platform, "platform not registered");
                outcomes.insert(
                    platform.clone(),
                    PlatformOutcome::failed(ErrorKind::Unavailable, "not registered"),
                );
                continue;
            };

            if registration.health.is_revoked() {
                outcomes.insert(
                    platform.clone(),
                    PlatformOutcome::failed(ErrorKind::Unauthorized, "credential rejected"),
                );
                continue;
            }

            if let Some(cache) = &self.cache {
                let key = CacheKey::new(platform, query.text(), query.limit());
                if let Some(records) = cache.get(&key).await {
                    tracing::debug!(%platform, count = records.len(), "cache hit");
                    outcomes.insert(platform.clone(), PlatformOutcome::Success(records));
                    continue;
                }
            }

            match registration.limiter.try_admit() {
                Admission::Denied { retry_after } => {
                    tracing::debug!(%platform, ?retry_after, "admission denied");
                    outcomes.insert(
                        platform.clone(),
                        PlatformOutcome::RateLimited { retry_after },
                    );
                }
                Admission::Admitted => {
                    tracing::debug!(%platform, "admitted");
                    workers.push(self.dispatch(platform.clone(), Arc::clone(registration), query));
                }
            }
        }

        let settled = futures::future::join_all(workers).await;

        for (platform, registration, result) in settled {
            let outcome = self.settle(&platform, &registration, query, result).await;
            outcomes.insert(platform, outcome);
        }

        let result = partition_outcomes(outcomes, query.limit());
        tracing::info!(
            succeeded = result.succeeded_platforms.len(),
            failed = result.failed_platforms.len(),
            count = result.records.len(),
            "aggregation complete"
        );
        Ok(result)
    }

    /// Per-platform health, in identifier order.
    pub fn health_report(&self) -> Vec<HealthReport> {
        let mut report: Vec<HealthReport> = self
            .platforms
            .iter()
            .map(|(platform, registration)| {
                let health = registration.health.snapshot();
                HealthReport {
                    platform: platform.clone(),
                    state: health.state,
                    consecutive_failures: health.consecutive_failures,
                    last_error: health.last_error,
                }
            })
            .collect();
        report.sort_by(|a, b| a.platform.cmp(&b.platform));
        report
    }

    /// Spawn the worker for one admitted platform.
    ///
    /// The deadline is enforced around the searcher call inside the
    /// worker, so a late searcher is dropped rather than left running.
    fn dispatch(
        &self,
        platform: PlatformId,
        registration: Arc<Registration>,
        query: &Query,
    ) -> impl std::future::Future<
        Output = (
            PlatformId,
            Arc<Registration>,
            Result<Vec<HighlightRecord>, PlatformError>,
        ),
    > {
        let timeout = self.config.call_timeout;
        let worker_query = query.clone();
        let searcher = Arc::clone(&registration.searcher);

        let handle = tokio::spawn(async move {
            let limit = worker_query.limit();
            match tokio::time::timeout(timeout, searcher.search(&worker_query, limit, timeout))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(PlatformError::unavailable("timeout")),
            }
        });

        async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(PlatformError::unavailable(format!(
                    "search worker failed: {e}"
                ))),
            };
            (platform, registration, result)
        }
    }

    /// Turn one worker's result into an outcome and update platform state.
    async fn settle(
        &self,
        platform: &PlatformId,
        registration: &Registration,
        query: &Query,
        result: Result<Vec<HighlightRecord>, PlatformError>,
    ) -> PlatformOutcome {
        match result {
            Ok(records) => {
                let records = conform_records(platform, records, query.limit());
                tracing::debug!(%platform, count = records.len(), "platform returned results");
                registration.health.record_success();
                if let Some(cache) = &self.cache {
                    let key = CacheKey::new(platform, query.text(), query.limit());
                    cache.insert(key, records.clone()).await;
                }
                PlatformOutcome::Success(records)
            }
            Err(err) if err.kind == ErrorKind::Malformed => {
                tracing::warn!(%platform, error = %err, "malformed response treated as empty");
                registration.health.record_failure(ErrorKind::Malformed);
                PlatformOutcome::Success(Vec::new())
            }
            Err(err) => {
                tracing::warn!(%platform, error = %err, "platform query failed");
                registration.health.record_failure(err.kind);
                PlatformOutcome::Failed {
                    kind: err.kind,
                    message: err.message,
                }
            }
        }
    }
}

/// Drop records that claim a different platform and enforce the limit.
fn conform_records(
    platform: &PlatformId,
    mut records: Vec<HighlightRecord>,
    limit: usize,
) -> Vec<HighlightRecord> {
    let before = records.len();
    records.retain(|record| record.platform() == platform);
    if records.len() != before {
        tracing::warn!(
            %platform,
            dropped = before - records.len(),
            "dropped records attributed to another platform"
        );
    }
    records.truncate(limit);
    records
}

/// Split outcomes into succeeded and failed platforms and merge records.
///
/// Iterates in platform order, so the result does not depend on which
/// worker finished first.
pub fn partition_outcomes(
    outcomes: BTreeMap<PlatformId, PlatformOutcome>,
    limit: usize,
) -> AggregatedResult {
    let mut result = AggregatedResult::default();
    let mut record_lists = Vec::new();

    for (platform, outcome) in outcomes {
        match outcome {
            PlatformOutcome::Success(records) => {
                result.succeeded_platforms.insert(platform.clone());
                record_lists.push((platform, records));
            }
            PlatformOutcome::RateLimited { retry_after } => {
                result
                    .failed_platforms
                    .insert(platform.clone(), ErrorKind::Throttled);
                result
                    .failure_messages
                    .insert(platform.clone(), "rate limited".into());
                result.retry_after.insert(platform, retry_after);
            }
            PlatformOutcome::Failed { kind, message } => {
                result.failed_platforms.insert(platform.clone(), kind);
                result.failure_messages.insert(platform, message);
            }
        }
    }

    result.records = merge(record_lists, limit);
    result
}
