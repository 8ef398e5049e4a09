//! Rate Limiting Infrastructure
//!
//! Client-side fixed-window limiter. A window opens on the first request for a
//! key and lasts `policy.window`; denials never move its boundary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use kernel::time::{Clock, SystemClock};

/// Number of tracked keys at which expired windows are swept on insert
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Rate limit policy for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitPolicy {
    pub const fn from_millis(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_millis(window_ms),
        }
    }

    pub fn window_ms(&self) -> i64 {
        self.window.as_millis() as i64
    }
}

/// Rate limit check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at_ms: i64,
}

/// Counter state for one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    pub count: u32,
    /// Window end (Unix timestamp ms)
    pub reset_at_ms: i64,
}

impl RateLimitWindow {
    fn open(now_ms: i64, window_ms: i64) -> Self {
        Self {
            count: 1,
            reset_at_ms: now_ms + window_ms,
        }
    }

    /// Strict comparison: a window is still live at exactly `reset_at_ms`
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.reset_at_ms
    }
}

/// Fixed-window limiter keyed by an arbitrary string (user id, IP, ...)
pub struct ClientRateLimiter {
    policy: RateLimitPolicy,
    windows: Mutex<HashMap<String, RateLimitWindow>>,
    clock: Arc<dyn Clock>,
    sweep_threshold: usize,
}

impl ClientRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: RateLimitPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
            clock,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }

    /// Override the key count that triggers an inline sweep
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold.max(1);
        self
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    /// Record a request for `key` if the window allows it
    pub fn can_make_request(&self, key: &str) -> bool {
        self.check(key).allowed
    }

    /// Check and increment the counter for `key`
    ///
    /// Opens a fresh window (count = 1) when none exists or the previous one
    /// expired. A denied request leaves the window untouched.
    pub fn check(&self, key: &str) -> RateLimitResult {
        let now_ms = self.clock.now_ms();
        let max = self.policy.max_requests;
        let mut windows = self.lock();

        if let Some(window) = windows.get_mut(key) {
            if !window.is_expired(now_ms) {
                let allowed = window.count < max;
                if allowed {
                    window.count += 1;
                }
                return RateLimitResult {
                    allowed,
                    remaining: max.saturating_sub(window.count),
                    reset_at_ms: window.reset_at_ms,
                };
            }
        }

        if windows.len() >= self.sweep_threshold && !windows.contains_key(key) {
            let removed = sweep_locked(&mut windows, now_ms);
            tracing::debug!(
                removed = removed,
                tracked = windows.len(),
                "Swept expired rate limit windows"
            );
        }

        let window = RateLimitWindow::open(now_ms, self.policy.window_ms());
        windows.insert(key.to_string(), window);

        RateLimitResult {
            allowed: true,
            remaining: max.saturating_sub(window.count),
            reset_at_ms: window.reset_at_ms,
        }
    }

    /// Requests left in the current window; never mutates state
    pub fn remaining_requests(&self, key: &str) -> u32 {
        let now_ms = self.clock.now_ms();
        let windows = self.lock();

        match windows.get(key) {
            Some(window) if !window.is_expired(now_ms) => {
                self.policy.max_requests.saturating_sub(window.count)
            }
            _ => self.policy.max_requests,
        }
    }

    /// Current window for `key`, if one is live
    pub fn window(&self, key: &str) -> Option<RateLimitWindow> {
        let now_ms = self.clock.now_ms();
        self.lock()
            .get(key)
            .filter(|w| !w.is_expired(now_ms))
            .copied()
    }

    /// Drop every expired window, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now_ms = self.clock.now_ms();
        sweep_locked(&mut self.lock(), now_ms)
    }

    /// Number of keys currently tracked (live or not yet swept)
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitWindow>> {
        // Counters stay consistent even if a holder panicked.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn sweep_locked(windows: &mut HashMap<String, RateLimitWindow>, now_ms: i64) -> usize {
    let before = windows.len();
    windows.retain(|_, w| !w.is_expired(now_ms));
    before - windows.len()
}

impl std::fmt::Debug for ClientRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRateLimiter")
            .field("policy", &self.policy)
            .field("tracked_keys", &self.tracked_keys())
            .finish()
    }
}
