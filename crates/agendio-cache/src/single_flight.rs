// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-key single-flight coordination over a [`TtlCache`].
//!
//! On a cache miss, callers serialize on a per-key async lock with a
//! double-checked read, so that concurrent misses for one key trigger at
//! most one upstream fetch. The lock registry is transient: entries are
//! dropped once a fetch completes with no waiters queued, and a pruning
//! pass runs whenever the registry grows past a fixed threshold.

use std::hash::Hash;
use std::time::Duration;

use tracing::debug;

use crate::registry::LockRegistry;
use crate::ttl::TtlCache;

/// A [`TtlCache`] whose misses are fetched at most once per key at a time.
#[derive(Debug)]
pub struct SingleFlightCache<K, V> {
    cache: TtlCache<K, V>,
    locks: LockRegistry<K>,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    /// Creates a cache with the given TTL, advisory capacity, and the
    /// registry size at which idle fetch locks are pruned.
    pub fn new(ttl: Duration, max_entries: usize, cleanup_threshold: usize) -> Self {
        Self {
            cache: TtlCache::new(ttl, max_entries),
            locks: LockRegistry::new(cleanup_threshold),
        }
    }

    /// Returns the cached value for `key`, fetching it with `fetch` on a miss.
    ///
    /// Fast path: a live entry is returned with no coordination at all.
    /// Slow path: the caller acquires the per-key lock, re-checks the cache
    /// (another caller may have completed the fetch while this one waited),
    /// and only on a second miss runs `fetch`, storing the result with a
    /// fresh expiry.
    ///
    /// Fetch failures propagate to the caller and cache nothing; the next
    /// waiter in line re-checks the cache and performs its own fetch.
    pub async fn get_or_fetch<E, F, Fut>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.cache.get(key) {
            debug!(key = %key, "cache hit");
            return Ok(value);
        }

        let handle = self.locks.acquire_handle(key);
        let result = {
            let _guard = handle.lock().await;

            // Double-check after acquiring the lock.
            if let Some(value) = self.cache.get(key) {
                debug!(key = %key, "cache hit after lock");
                Ok(value)
            } else {
                debug!(key = %key, "cache miss, fetching");
                match fetch().await {
                    Ok(value) => {
                        self.cache.insert(key.clone(), value.clone());
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        };
        self.locks.release(key, &handle);
        result
    }

    /// Direct read of the underlying cache, no coordination.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key)
    }

    /// Direct insert into the underlying cache with a fresh expiry.
    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value);
    }

    /// Drops all cached entries. Fetch locks are left to the pruning pass.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of fetch locks currently registered.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// The fetch-lock registry (exposed for tests and diagnostics).
    pub fn locks(&self) -> &LockRegistry<K> {
        &self.locks
    }
}
