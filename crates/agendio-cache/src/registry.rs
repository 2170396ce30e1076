// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transient per-key lock registry.
//!
//! Backs both the single-flight fetch locks and the per-session request
//! serializer: a handle is created on first use, dropped again once its
//! last user releases it, and a pruning pass bounds registry growth once
//! the map crosses a size threshold. A handle is only ever pruned while
//! the registry owns the sole `Arc` reference, so no waiter can lose a
//! lock it still holds.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::debug;

/// Registry of per-key async mutex handles with threshold-triggered pruning.
#[derive(Debug)]
pub struct LockRegistry<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
    cleanup_threshold: usize,
}

impl<K> LockRegistry<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a registry that prunes idle handles once it grows past
    /// `cleanup_threshold` entries.
    pub fn new(cleanup_threshold: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            cleanup_threshold,
        }
    }

    /// Returns the lock handle for `key`, creating it on first use.
    ///
    /// When the registry has grown past the cleanup threshold, every entry
    /// except the current key and handles other callers still reference is
    /// removed first.
    pub fn acquire_handle(&self, key: &K) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.len() > self.cleanup_threshold {
            let before = locks.len();
            locks.retain(|k, handle| k == key || Arc::strong_count(handle) > 1);
            debug!(removed = before - locks.len(), "pruned idle lock handles");
        }
        Arc::clone(
            locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Drops the registry entry for `key` once no other caller holds the
    /// handle (registry + the caller's clone = 2 references).
    pub fn release(&self, key: &K, handle: &Arc<AsyncMutex<()>>) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(handle) <= 2 {
            locks.remove(key);
        }
    }

    /// Number of registered handles.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when no handles are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` currently has a registered handle.
    pub fn contains(&self, key: &K) -> bool {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}
