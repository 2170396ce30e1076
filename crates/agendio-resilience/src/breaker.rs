// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-key circuit breaker with a time-bounded failure counter.
//!
//! The breaker has no half-open probing state. It opens once a key
//! accumulates `failure_threshold` failures within the counting window and
//! closes again either explicitly (a recorded success) or passively (the
//! window elapses with no further failures). It therefore always fails
//! open toward *allowing* traffic; a key is never permanently locked out.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    expires_at: Instant,
}

/// Failure accounting for one upstream endpoint, keyed by tenant (or any
/// other per-call key).
#[derive(Debug)]
pub struct CircuitBreaker<K> {
    windows: Mutex<HashMap<K, FailureWindow>>,
    failure_threshold: u32,
    window: Duration,
}

impl<K> CircuitBreaker<K>
where
    K: Eq + Hash + Clone + std::fmt::Display,
{
    /// Creates a breaker that opens at `failure_threshold` failures within
    /// `window` of the most recent one.
    pub fn new(failure_threshold: u32, window: Duration) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            failure_threshold,
            window,
        }
    }

    /// Whether calls for `key` should currently be skipped.
    ///
    /// Used as a fast pre-check before any coordination or network work.
    /// An expired failure window counts as closed and is swept here.
    pub fn is_open(&self, key: &K) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match windows.get(key) {
            Some(w) if Instant::now() >= w.expires_at => {
                windows.remove(key);
                false
            }
            Some(w) => w.count >= self.failure_threshold,
            None => false,
        }
    }

    /// Records one failure for `key`, refreshing the window TTL.
    pub fn record_failure(&self, key: &K) {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let entry = windows.entry(key.clone()).or_insert(FailureWindow {
            count: 0,
            expires_at: now + self.window,
        });
        if now >= entry.expires_at {
            entry.count = 0;
        }
        entry.count += 1;
        entry.expires_at = now + self.window;
        if entry.count == self.failure_threshold {
            warn!(key = %key, failures = entry.count, "circuit opened");
        } else {
            debug!(key = %key, failures = entry.count, "upstream failure recorded");
        }
    }

    /// Clears the failure counter for `key`.
    pub fn record_success(&self, key: &K) {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if windows.remove(key).is_some() {
            debug!(key = %key, "circuit closed after success");
        }
    }

    /// True if any key is currently open. Used for health reporting.
    pub fn any_open(&self) -> bool {
        let windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        windows
            .values()
            .any(|w| w.count >= self.failure_threshold && now < w.expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker<i64> {
        CircuitBreaker::new(3, Duration::from_secs(300))
    }

    #[test]
    fn closed_by_default() {
        let cb = breaker();
        assert!(!cb.is_open(&1));
        assert!(!cb.any_open());
    }

    #[test]
    fn opens_at_threshold() {
        let cb = breaker();
        cb.record_failure(&1);
        cb.record_failure(&1);
        assert!(!cb.is_open(&1));
        cb.record_failure(&1);
        assert!(cb.is_open(&1));
        assert!(cb.any_open());
    }

    #[test]
    fn success_resets_counter() {
        let cb = breaker();
        for _ in 0..3 {
            cb.record_failure(&1);
        }
        assert!(cb.is_open(&1));
        cb.record_success(&1);
        assert!(!cb.is_open(&1));
    }

    #[test]
    fn keys_are_independent() {
        let cb = breaker();
        for _ in 0..3 {
            cb.record_failure(&1);
        }
        assert!(cb.is_open(&1));
        assert!(!cb.is_open(&2));
    }

    #[test]
    fn window_expiry_closes_passively() {
        let cb = CircuitBreaker::new(3, Duration::from_millis(0));
        for _ in 0..3 {
            cb.record_failure(&1);
        }
        // The zero-length window has already elapsed.
        assert!(!cb.is_open(&1));
        assert!(!cb.any_open());
    }

    #[test]
    fn stale_window_restarts_count() {
        let cb = CircuitBreaker::new(3, Duration::from_millis(0));
        cb.record_failure(&1);
        cb.record_failure(&1);
        // Each failure found the previous window expired, so the count
        // never accumulates.
        assert!(!cb.is_open(&1));
    }
}
