// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilient read gateway: circuit-breaker pre-check + bounded retry.

use std::hash::Hash;

use agendio_core::UpstreamError;

use crate::breaker::CircuitBreaker;
use crate::retry::{retry_read, RetryPolicy};

/// Wraps upstream read calls with a breaker pre-check, transport-level
/// retry, and breaker bookkeeping on the outcome.
///
/// One gateway is constructed per upstream endpoint so each endpoint keeps
/// its own failure memory (the breaker key is the tenant id within it).
#[derive(Debug)]
pub struct ResilientGateway<K> {
    policy: RetryPolicy,
    breaker: CircuitBreaker<K>,
}

impl<K> ResilientGateway<K>
where
    K: Eq + Hash + Clone + std::fmt::Display,
{
    pub fn new(policy: RetryPolicy, breaker: CircuitBreaker<K>) -> Self {
        Self { policy, breaker }
    }

    /// Runs a read call for `key` through the breaker and retry policy.
    ///
    /// - Breaker open: returns [`UpstreamError::CircuitOpen`] without
    ///   attempting any coordination or network work.
    /// - Transport retries exhausted: records one failure against the
    ///   breaker and re-raises the final error.
    /// - Non-transient rejection: surfaced immediately; not counted toward
    ///   the breaker (the upstream answered, it is not down).
    /// - Success: clears the key's failure counter.
    pub async fn read<T, F, Fut>(&self, key: &K, op: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        if self.breaker.is_open(key) {
            return Err(UpstreamError::CircuitOpen(key.to_string()));
        }

        match retry_read(&self.policy, op).await {
            Ok(value) => {
                self.breaker.record_success(key);
                Ok(value)
            }
            Err(e) => {
                if e.is_transient() {
                    self.breaker.record_failure(key);
                }
                Err(e)
            }
        }
    }

    /// The breaker backing this gateway (for health reporting).
    pub fn breaker(&self) -> &CircuitBreaker<K> {
        &self.breaker
    }
}
