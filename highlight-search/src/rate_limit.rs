//! Fixed-window admission control, one limiter per platform.
//!
//! Each [`RateLimiter`] owns its window state behind its own [`Mutex`],
//! so admission checks for one platform are serialised while different
//! platforms never contend. [`RateLimiter::try_admit`] never blocks on
//! I/O or sleeps; the lock is held only for the counter update.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimitConfig;

/// Decision returned by an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The call may proceed; one unit of the window budget was consumed.
    Admitted,
    /// The window budget is spent.
    Denied {
        /// Time until the current window closes.
        retry_after: Duration,
    },
}

#[derive(Debug)]
struct WindowState {
    window_start: Option<Instant>,
    calls_in_window: u32,
}

/// Fixed-window call counter for a single platform.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    /// Create a limiter with an empty window.
    pub fn new(limits: RateLimitConfig) -> Self {
        Self {
            limits,
            state: Mutex::new(WindowState {
                window_start: None,
                calls_in_window: 0,
            }),
        }
    }

    /// The limits this limiter enforces.
    pub fn limits(&self) -> RateLimitConfig {
        self.limits
    }

    /// Decide whether a call may be made now.
    pub fn try_admit(&self) -> Admission {
        self.try_admit_at(Instant::now())
    }

    /// Decide whether a call may be made at `now`.
    ///
    /// A window opens on the first call and resets once `window` has
    /// elapsed since it opened.
    pub fn try_admit_at(&self, now: Instant) -> Admission {
        // A poisoned lock only means another admission panicked mid-update;
        // the counters are still usable.
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let window_start = match state.window_start {
            Some(start) if now.saturating_duration_since(start) < self.limits.window => start,
            _ => {
                state.window_start = Some(now);
                state.calls_in_window = 0;
                now
            }
        };

        if state.calls_in_window < self.limits.max_calls_per_window {
            state.calls_in_window += 1;
            Admission::Admitted
        } else {
            let elapsed = now.saturating_duration_since(window_start);
            Admission::Denied {
                retry_after: self.limits.window.saturating_sub(elapsed),
            }
        }
    }

    /// Calls admitted in the current window, as last observed.
    pub fn calls_in_window(&self) -> u32 {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .calls_in_window
    }
}
