//! Per-platform health tracking and credential revocation.
//!
//! Tracks consecutive failures per platform and latches a platform as
//! revoked once its backend rejects the credential. A revoked platform
//! is reported as unauthorized without being contacted until it is
//! registered again.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐  transient failure  ┌──────────┐
//! │ Healthy ├────────────────────►│ Degraded │
//! └───▲──┬──┘◄────────────────────┴────┬─────┘
//!     │  │         success             │
//!     │  │ unauthorized                │ unauthorized
//!     │  ▼                             ▼
//!     │ ┌─────────────────────────────────┐
//!     └─┤ Revoked (until re-registration) │
//!       └─────────────────────────────────┘
//! ```

use std::sync::Mutex;

use tokio::time::Instant;

use crate::error::ErrorKind;
use crate::types::PlatformId;

/// Health state of a single platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    /// Last contact succeeded, or the platform has not been contacted yet.
    Healthy,
    /// One or more consecutive calls failed with a transient error.
    Degraded,
    /// The backend rejected the credential. Only re-registration clears this.
    Revoked,
}

/// Health data for one platform.
#[derive(Debug, Clone)]
pub struct PlatformHealth {
    /// Current state.
    pub state: HealthState,
    /// Number of consecutive failures since the last success.
    pub consecutive_failures: u32,
    /// Kind of the most recent failure, if any.
    pub last_error: Option<ErrorKind>,
    /// When the last failure occurred (if any).
    pub last_failure_at: Option<Instant>,
    /// When the last success occurred (if any).
    pub last_success_at: Option<Instant>,
}

impl Default for PlatformHealth {
    fn default() -> Self {
        Self {
            state: HealthState::Healthy,
            consecutive_failures: 0,
            last_error: None,
            last_failure_at: None,
            last_success_at: None,
        }
    }
}

impl PlatformHealth {
    /// Record a successful call.
    ///
    /// Resets the failure count. A revoked platform stays revoked.
    pub fn record_success(&mut self, now: Instant) {
        self.consecutive_failures = 0;
        self.last_success_at = Some(now);
        if self.state != HealthState::Revoked {
            self.state = HealthState::Healthy;
        }
    }

    /// Record a failed call of the given kind.
    pub fn record_failure(&mut self, kind: ErrorKind, now: Instant) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(kind);
        self.last_failure_at = Some(now);
        self.state = match (self.state, kind) {
            (_, ErrorKind::Unauthorized) | (HealthState::Revoked, _) => HealthState::Revoked,
            _ => HealthState::Degraded,
        };
    }
}

/// Thread-safe health tracker owned by one platform registration.
#[derive(Debug, Default)]
pub struct HealthTracker {
    inner: Mutex<PlatformHealth>,
}

impl HealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut PlatformHealth) -> R) -> R {
        let mut guard = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn record_success(&self) {
        self.with(|h| h.record_success(Instant::now()));
    }

    pub fn record_failure(&self, kind: ErrorKind) {
        self.with(|h| h.record_failure(kind, Instant::now()));
    }

    /// Whether the platform's credential has been rejected.
    pub fn is_revoked(&self) -> bool {
        self.with(|h| h.state == HealthState::Revoked)
    }

    /// Copy of the current health data.
    pub fn snapshot(&self) -> PlatformHealth {
        self.with(|h| h.clone())
    }
}

/// One line of [`crate::SearchOrchestrator::health_report`].
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub platform: PlatformId,
    pub state: HealthState,
    pub consecutive_failures: u32,
    pub last_error: Option<ErrorKind>,
}
