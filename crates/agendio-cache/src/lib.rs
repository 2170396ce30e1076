// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-expiring caches with per-key single-flight fetch coordination.
//!
//! Three layers:
//! - [`TtlCache`]: a plain key/value store where entries expire after a
//!   fixed TTL. Eviction is TTL-only; the capacity bound is advisory.
//! - [`LockRegistry`]: transient per-key async mutex handles with
//!   threshold-triggered pruning, shared with the session serializer.
//! - [`SingleFlightCache`]: a [`TtlCache`] fronted by a [`LockRegistry`]
//!   so that N concurrent misses for the same key collapse into exactly
//!   one upstream fetch (thundering-herd prevention).
//!
//! One instance is constructed per data kind (schedule, business context,
//! FAQ set, compiled agent), each with its own TTL and size hints, and
//! handed to the services that need it -- there is no ambient global state.

pub mod registry;
pub mod single_flight;
pub mod ttl;

pub use registry::LockRegistry;
pub use single_flight::SingleFlightCache;
pub use ttl::TtlCache;
