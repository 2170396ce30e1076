// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-session request serialization.
//!
//! Two near-simultaneous messages from the same conversation (a client
//! double-submit, a retry racing the original) must not mutate the same
//! conversation state or trigger duplicate tool side effects. The gate
//! gives each session a transient mutex: the second turn waits for the
//! first to fully finish before starting. Different sessions never block
//! each other.

use agendio_cache::LockRegistry;
use agendio_core::SessionId;
use tracing::debug;
use uuid::Uuid;

/// Registry of per-session locks with the same transient lifecycle and
/// pruning policy as the fetch-lock registries.
#[derive(Debug)]
pub struct SessionGate {
    locks: LockRegistry<SessionId>,
}

impl SessionGate {
    /// Creates a gate that prunes idle session locks once the registry
    /// grows past `cleanup_threshold` entries.
    pub fn new(cleanup_threshold: usize) -> Self {
        Self {
            locks: LockRegistry::new(cleanup_threshold),
        }
    }

    /// Runs `body` holding the session's lock, releasing it on every exit
    /// path. Turns for one session execute strictly one at a time, in
    /// lock-acquisition order.
    pub async fn with_session_lock<T, Fut>(&self, session_id: SessionId, body: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let turn_id = Uuid::new_v4();
        let handle = self.locks.acquire_handle(&session_id);
        let result = {
            let _guard = handle.lock().await;
            debug!(session_id = %session_id, turn_id = %turn_id, "session lock acquired");
            body.await
        };
        self.locks.release(&session_id, &handle);
        debug!(session_id = %session_id, turn_id = %turn_id, "session lock released");
        result
    }

    /// Number of session locks currently registered.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn same_session_turns_never_overlap() {
        let gate = Arc::new(SessionGate::new(500));
        let in_flight = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            let in_flight = Arc::clone(&in_flight);
            let overlaps = Arc::clone(&overlaps);
            tasks.push(tokio::spawn(async move {
                gate.with_session_lock(SessionId(1), async {
                    if in_flight.swap(true, Ordering::SeqCst) {
                        overlaps.fetch_add(1, Ordering::SeqCst);
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.store(false, Ordering::SeqCst);
                })
                .await;
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn different_sessions_run_concurrently() {
        let gate = Arc::new(SessionGate::new(500));
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        // Session 1 holds its lock until session 2 signals it ran.
        let blocker = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.with_session_lock(SessionId(1), async {
                    rx.await.unwrap();
                })
                .await;
            })
        };

        // Session 2 must complete even while session 1 is held.
        gate.with_session_lock(SessionId(2), async {}).await;
        tx.send(()).unwrap();
        blocker.await.unwrap();
    }

    #[tokio::test]
    async fn gate_registry_drains_after_turns() {
        let gate = SessionGate::new(500);
        gate.with_session_lock(SessionId(7), async {}).await;
        assert_eq!(gate.lock_count(), 0);
    }

    #[tokio::test]
    async fn body_result_passes_through() {
        let gate = SessionGate::new(500);
        let value = gate
            .with_session_lock(SessionId(3), async { 21 * 2 })
            .await;
        assert_eq!(value, 42);
    }
}
