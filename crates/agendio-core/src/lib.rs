// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Agendio booking-agent workspace.
//!
//! Provides the shared error types and tenant/session identifiers used by
//! every other crate. Domain types (schedules, booking requests, tool
//! contexts) live in the crates that own them.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AgendioError, UpstreamError};
pub use types::{ProspectId, SessionId, TenantId};
