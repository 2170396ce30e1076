// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for upstream business-API calls.
//!
//! - [`CircuitBreaker`]: per-key failure accounting that short-circuits
//!   calls to a degraded upstream for a cooldown window.
//! - [`RetryPolicy`] / [`retry_read`]: bounded retry with exponential
//!   backoff for transport-level failures on idempotent reads.
//! - [`ResilientGateway`]: the two combined -- breaker pre-check, retried
//!   read, breaker bookkeeping on the outcome.
//!
//! Writes (calendar event creation) never pass through this crate: a write
//! whose response was lost to a timeout may still have landed, so it is
//! attempted exactly once and its failure surfaced to the caller.

pub mod breaker;
pub mod gateway;
pub mod retry;

pub use breaker::CircuitBreaker;
pub use gateway::ResilientGateway;
pub use retry::{retry_read, RetryPolicy};
