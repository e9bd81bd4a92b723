//! Integration tests for the search orchestrator.
//!
//! These tests drive `SearchOrchestrator::aggregate` end to end against
//! scripted in-process searchers (no network calls). Timing-sensitive
//! tests run on a paused tokio clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use highlight_search::{
    ErrorKind, HealthState, HighlightRecord, OrchestratorConfig, PlatformError, PlatformId,
    PlatformSearcher, Query, RateLimitConfig, SearchOrchestrator,
};

/// What a scripted searcher does when called.
#[derive(Clone)]
enum Script {
    Records(Vec<HighlightRecord>),
    Fail(PlatformError),
    Delay(Duration, Vec<HighlightRecord>),
    Panic,
}

struct ScriptedSearcher {
    platform: PlatformId,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSearcher {
    fn new(platform: &str, script: Script) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let searcher = Arc::new(Self {
            platform: PlatformId::new(platform),
            script,
            calls: Arc::clone(&calls),
        });
        (searcher, calls)
    }
}

#[async_trait]
impl PlatformSearcher for ScriptedSearcher {
    fn platform(&self) -> PlatformId {
        self.platform.clone()
    }

    async fn search(
        &self,
        _query: &Query,
        limit: usize,
        _timeout: Duration,
    ) -> Result<Vec<HighlightRecord>, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Records(records) => Ok(records.iter().take(limit).cloned().collect()),
            Script::Fail(err) => Err(err.clone()),
            Script::Delay(delay, records) => {
                tokio::time::sleep(*delay).await;
                Ok(records.iter().take(limit).cloned().collect())
            }
            Script::Panic => panic!("scripted searcher panic"),
        }
    }
}

fn make_record(platform: &str, id: &str, score: f64) -> HighlightRecord {
    HighlightRecord::new(
        PlatformId::new(platform),
        id,
        format!("{platform} highlight {id}"),
        format!("https://{platform}.example/{id}"),
    )
    .expect("valid record")
    .with_engagement_score(Some(score))
}

fn orchestrator(config: OrchestratorConfig) -> SearchOrchestrator {
    SearchOrchestrator::new(config).expect("valid config")
}

fn query(platforms: &[&str], limit: usize) -> Query {
    Query::new(
        "game winner",
        limit,
        platforms.iter().map(|p| PlatformId::new(*p)),
    )
    .expect("valid query")
}

fn ids(records: &[HighlightRecord]) -> Vec<&str> {
    records.iter().map(HighlightRecord::id).collect()
}

#[tokio::test]
async fn merged_output_interleaves_platforms_by_score() {
    let (a, _) = ScriptedSearcher::new(
        "a",
        Script::Records(vec![
            make_record("a", "A1", 10.0),
            make_record("a", "A2", 5.0),
            make_record("a", "A3", 1.0),
        ]),
    );
    let (b, _) = ScriptedSearcher::new(
        "b",
        Script::Records(vec![make_record("b", "B1", 8.0), make_record("b", "B2", 2.0)]),
    );
    let orchestrator = orchestrator(OrchestratorConfig::default())
        .with_searcher(a)
        .with_searcher(b);

    let result = orchestrator
        .aggregate(&query(&["a", "b"], 4))
        .await
        .expect("aggregates");

    assert_eq!(ids(&result.records), vec!["A1", "B1", "A2", "B2"]);
    assert_eq!(result.succeeded_platforms.len(), 2);
    assert!(result.failed_platforms.is_empty());
}

#[tokio::test(start_paused = true)]
async fn timed_out_platform_fails_alone() {
    let (slow, _) = ScriptedSearcher::new(
        "a",
        Script::Delay(Duration::from_secs(30), vec![make_record("a", "late", 99.0)]),
    );
    let (fast, _) = ScriptedSearcher::new(
        "b",
        Script::Records(vec![make_record("b", "B1", 3.0), make_record("b", "B2", 1.0)]),
    );
    let config = OrchestratorConfig {
        call_timeout: Duration::from_secs(2),
        ..Default::default()
    };
    let orchestrator = orchestrator(config).with_searcher(slow).with_searcher(fast);

    let result = orchestrator
        .aggregate(&query(&["a", "b"], 10))
        .await
        .expect("aggregates");

    assert_eq!(
        result.failed_platforms.get(&PlatformId::new("a")),
        Some(&ErrorKind::Unavailable)
    );
    assert_eq!(
        result
            .failure_messages
            .get(&PlatformId::new("a"))
            .map(String::as_str),
        Some("timeout")
    );
    assert!(result.succeeded_platforms.contains(&PlatformId::new("b")));
    assert_eq!(result.succeeded_platforms.len(), 1);
    assert_eq!(ids(&result.records), vec!["B1", "B2"]);
}

#[tokio::test(start_paused = true)]
async fn platforms_run_concurrently() {
    let (a, _) = ScriptedSearcher::new(
        "a",
        Script::Delay(Duration::from_secs(1), vec![make_record("a", "A1", 1.0)]),
    );
    let (b, _) = ScriptedSearcher::new(
        "b",
        Script::Delay(Duration::from_secs(1), vec![make_record("b", "B1", 2.0)]),
    );
    let (c, _) = ScriptedSearcher::new(
        "c",
        Script::Delay(Duration::from_secs(1), vec![make_record("c", "C1", 3.0)]),
    );
    let orchestrator = orchestrator(OrchestratorConfig::default())
        .with_searcher(a)
        .with_searcher(b)
        .with_searcher(c);

    let started = tokio::time::Instant::now();
    let result = orchestrator
        .aggregate(&query(&["a", "b", "c"], 10))
        .await
        .expect("aggregates");
    let elapsed = started.elapsed();

    assert_eq!(result.records.len(), 3);
    assert!(
        elapsed < Duration::from_secs(2),
        "latency should track the slowest platform, took {elapsed:?}"
    );
}

#[tokio::test]
async fn invalid_query_is_rejected_before_any_dispatch() {
    let (a, calls) = ScriptedSearcher::new("a", Script::Records(vec![make_record("a", "1", 1.0)]));
    let config = OrchestratorConfig::default()
        .with_rate_limit(PlatformId::new("a"), RateLimitConfig::new(1, Duration::from_secs(60)));
    let orchestrator = orchestrator(config).with_searcher(a);

    let err = orchestrator.query("   ", vec![PlatformId::new("a")]).unwrap_err();
    assert!(err.to_string().contains("text"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The single-call window is still unused.
    let result = orchestrator
        .aggregate(&query(&["a"], 5))
        .await
        .expect("aggregates");
    assert!(result.succeeded_platforms.contains(&PlatformId::new("a")));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exhausted_window_throttles_without_invoking_searcher() {
    let (limited, limited_calls) =
        ScriptedSearcher::new("a", Script::Records(vec![make_record("a", "1", 1.0)]));
    let (free, free_calls) =
        ScriptedSearcher::new("b", Script::Records(vec![make_record("b", "1", 1.0)]));
    let config = OrchestratorConfig::default()
        .with_rate_limit(PlatformId::new("a"), RateLimitConfig::new(3, Duration::from_secs(900)));
    let orchestrator = orchestrator(config)
        .with_searcher(limited)
        .with_searcher(free);

    let mut last = None;
    for _ in 0..5 {
        last = Some(
            orchestrator
                .aggregate(&query(&["a", "b"], 5))
                .await
                .expect("aggregates"),
        );
    }
    let last = last.expect("ran five times");

    assert_eq!(limited_calls.load(Ordering::SeqCst), 3);
    assert_eq!(free_calls.load(Ordering::SeqCst), 5);
    assert_eq!(
        last.failed_platforms.get(&PlatformId::new("a")),
        Some(&ErrorKind::Throttled)
    );
    let retry_after = last
        .retry_after
        .get(&PlatformId::new("a"))
        .copied()
        .expect("retry hint");
    assert!(retry_after > Duration::ZERO && retry_after <= Duration::from_secs(900));
    assert!(last.succeeded_platforms.contains(&PlatformId::new("b")));
    assert_eq!(last.records.len(), 1);
}

#[tokio::test]
async fn unregistered_platform_is_unavailable() {
    let (a, _) = ScriptedSearcher::new("a", Script::Records(vec![make_record("a", "1", 1.0)]));
    let orchestrator = orchestrator(OrchestratorConfig::default()).with_searcher(a);

    let result = orchestrator
        .aggregate(&query(&["a", "ghost"], 5))
        .await
        .expect("aggregates");

    assert_eq!(
        result.failed_platforms.get(&PlatformId::new("ghost")),
        Some(&ErrorKind::Unavailable)
    );
    assert_eq!(result.notices(), vec!["ghost unavailable: not registered"]);
}

#[tokio::test]
async fn total_failure_still_returns_a_result() {
    let (a, _) = ScriptedSearcher::new(
        "a",
        Script::Fail(PlatformError::unavailable("connection refused")),
    );
    let (b, _) = ScriptedSearcher::new("b", Script::Fail(PlatformError::throttled("429")));
    let orchestrator = orchestrator(OrchestratorConfig::default())
        .with_searcher(a)
        .with_searcher(b);

    let result = orchestrator
        .aggregate(&query(&["a", "b"], 5))
        .await
        .expect("per-platform failures never fail the aggregation");

    assert!(result.records.is_empty());
    assert!(result.succeeded_platforms.is_empty());
    assert_eq!(
        result.failed_platforms.get(&PlatformId::new("b")),
        Some(&ErrorKind::Throttled)
    );
    // Backend throttling carries no local retry hint.
    assert!(result.retry_after.is_empty());
}

#[tokio::test]
async fn unauthorized_platform_stays_revoked_until_reregistered() {
    let (a, calls) = ScriptedSearcher::new("a", Script::Fail(PlatformError::unauthorized("401")));
    let mut orchestrator = orchestrator(OrchestratorConfig::default()).with_searcher(a);

    for _ in 0..3 {
        let result = orchestrator
            .aggregate(&query(&["a"], 5))
            .await
            .expect("aggregates");
        assert_eq!(
            result.failed_platforms.get(&PlatformId::new("a")),
            Some(&ErrorKind::Unauthorized)
        );
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.health_report()[0].state, HealthState::Revoked);

    let (replacement, replacement_calls) =
        ScriptedSearcher::new("a", Script::Records(vec![make_record("a", "1", 1.0)]));
    orchestrator.register(replacement);
    let result = orchestrator
        .aggregate(&query(&["a"], 5))
        .await
        .expect("aggregates");

    assert!(result.succeeded_platforms.contains(&PlatformId::new("a")));
    assert_eq!(replacement_calls.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.health_report()[0].state, HealthState::Healthy);
}

#[tokio::test]
async fn reregistration_keeps_rate_limit_window() {
    let (first, _) = ScriptedSearcher::new("a", Script::Records(vec![]));
    let config = OrchestratorConfig::default()
        .with_rate_limit(PlatformId::new("a"), RateLimitConfig::new(1, Duration::from_secs(900)));
    let mut orchestrator = orchestrator(config).with_searcher(first);

    orchestrator
        .aggregate(&query(&["a"], 5))
        .await
        .expect("aggregates");

    let (second, second_calls) = ScriptedSearcher::new("a", Script::Records(vec![]));
    orchestrator.register(second);
    let result = orchestrator
        .aggregate(&query(&["a"], 5))
        .await
        .expect("aggregates");

    assert_eq!(
        result.failed_platforms.get(&PlatformId::new("a")),
        Some(&ErrorKind::Throttled)
    );
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_response_counts_as_empty_success() {
    let (a, _) = ScriptedSearcher::new(
        "a",
        Script::Fail(PlatformError::malformed("unexpected JSON")),
    );
    let (b, _) = ScriptedSearcher::new("b", Script::Records(vec![make_record("b", "1", 1.0)]));
    let orchestrator = orchestrator(OrchestratorConfig::default())
        .with_searcher(a)
        .with_searcher(b);

    let result = orchestrator
        .aggregate(&query(&["a", "b"], 5))
        .await
        .expect("aggregates");

    assert!(result.succeeded_platforms.contains(&PlatformId::new("a")));
    assert!(result.failed_platforms.is_empty());
    assert_eq!(ids(&result.records), vec!["1"]);
}

#[tokio::test]
async fn panicking_searcher_fails_only_its_platform() {
    let (a, _) = ScriptedSearcher::new("a", Script::Panic);
    let (b, _) = ScriptedSearcher::new("b", Script::Records(vec![make_record("b", "1", 1.0)]));
    let orchestrator = orchestrator(OrchestratorConfig::default())
        .with_searcher(a)
        .with_searcher(b);

    let result = orchestrator
        .aggregate(&query(&["a", "b"], 5))
        .await
        .expect("aggregates");

    assert_eq!(
        result.failed_platforms.get(&PlatformId::new("a")),
        Some(&ErrorKind::Unavailable)
    );
    assert_eq!(result.records.len(), 1);
}

#[tokio::test]
async fn cached_results_skip_searcher_and_rate_limiter() {
    let (a, calls) = ScriptedSearcher::new("a", Script::Records(vec![make_record("a", "1", 1.0)]));
    let config = OrchestratorConfig {
        cache_ttl: Duration::from_secs(60),
        ..Default::default()
    }
    .with_rate_limit(PlatformId::new("a"), RateLimitConfig::new(1, Duration::from_secs(900)));
    let orchestrator = orchestrator(config).with_searcher(a);

    for _ in 0..3 {
        let result = orchestrator
            .aggregate(&query(&["a"], 5))
            .await
            .expect("aggregates");
        assert_eq!(ids(&result.records), vec!["1"]);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn records_from_other_platforms_are_dropped() {
    let (a, _) = ScriptedSearcher::new(
        "a",
        Script::Records(vec![make_record("a", "own", 1.0), make_record("b", "stray", 50.0)]),
    );
    let orchestrator = orchestrator(OrchestratorConfig::default()).with_searcher(a);

    let result = orchestrator
        .aggregate(&query(&["a"], 5))
        .await
        .expect("aggregates");
    assert_eq!(ids(&result.records), vec!["own"]);
}

#[tokio::test(start_paused = true)]
async fn ordering_ignores_completion_order() {
    let records_a = vec![make_record("a", "x", 4.0), make_record("a", "y", 4.0)];
    let records_b = vec![make_record("b", "x", 4.0), make_record("b", "z", 9.0)];

    let run = |delay_a: u64, delay_b: u64| {
        let (a, _) = ScriptedSearcher::new(
            "a",
            Script::Delay(Duration::from_millis(delay_a), records_a.clone()),
        );
        let (b, _) = ScriptedSearcher::new(
            "b",
            Script::Delay(Duration::from_millis(delay_b), records_b.clone()),
        );
        orchestrator(OrchestratorConfig::default())
            .with_searcher(a)
            .with_searcher(b)
    };

    let a_first = run(10, 500)
        .aggregate(&query(&["a", "b"], 10))
        .await
        .expect("aggregates");
    let b_first = run(500, 10)
        .aggregate(&query(&["a", "b"], 10))
        .await
        .expect("aggregates");

    assert_eq!(a_first.records, b_first.records);
    let keys: Vec<(&str, &str)> = a_first
        .records
        .iter()
        .map(|r| (r.platform().as_str(), r.id()))
        .collect();
    assert_eq!(keys, vec![("b", "z"), ("a", "x"), ("a", "y"), ("b", "x")]);
}

#[tokio::test]
async fn partition_and_limit_invariants_hold() {
    let many = (0..8)
        .map(|i| make_record("a", &format!("a{i}"), f64::from(i)))
        .collect();
    let tied = (0..3)
        .map(|i| make_record("d", &format!("d{i}"), 2.5))
        .collect();
    let scripts = [
        ("a", Script::Records(many)),
        ("b", Script::Fail(PlatformError::unavailable("down"))),
        ("c", Script::Records(Vec::new())),
        ("d", Script::Records(tied)),
    ];
    let mut orchestrator = orchestrator(OrchestratorConfig::default());
    for (platform, script) in scripts.iter().cloned() {
        let (searcher, _) = ScriptedSearcher::new(platform, script);
        orchestrator.register(searcher);
    }

    let selections: [&[&str]; 4] = [
        &["a", "b", "c", "d"],
        &["a", "a", "ghost"],
        &["b", "c"],
        &["d", "a"],
    ];
    for selection in selections {
        for limit in [1, 3, 20] {
            let request = query(selection, limit);
            let result = orchestrator.aggregate(&request).await.expect("aggregates");

            assert!(result.records.len() <= limit);
            for platform in request.platforms() {
                let succeeded = result.succeeded_platforms.contains(platform);
                let failed = result.failed_platforms.contains_key(platform);
                assert!(succeeded ^ failed, "{platform} must be in exactly one set");
            }
            assert_eq!(
                result.succeeded_platforms.len() + result.failed_platforms.len(),
                request.platforms().len()
            );
            for record in &result.records {
                assert!(result.succeeded_platforms.contains(record.platform()));
            }
        }
    }
}
