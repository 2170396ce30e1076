// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL key/value store with expiry-on-read semantics.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// A time-expiring key/value store.
///
/// An entry is readable until `now >= expires_at`, after which it is treated
/// as absent and dropped on the next access. `max_entries` is advisory: it
/// is never enforced on insert, it only feeds a log line when crossed, so
/// TTL expiry remains the single eviction mechanism.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache with the given TTL and advisory capacity.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Returns a clone of the live value for `key`, removing the entry if
    /// it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` under `key` with a fresh expiry of now + TTL.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + self.ttl,
            },
        );
        if entries.len() > self.max_entries {
            debug!(
                len = entries.len(),
                max_entries = self.max_entries,
                "cache grew past advisory capacity"
            );
        }
    }

    /// Number of entries currently stored (live or not yet swept).
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Mainly useful in tests.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The configured entry TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
