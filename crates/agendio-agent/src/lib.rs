// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational-layer coordination for the booking agent.
//!
//! This crate sits between the external LLM agent and the domain crates:
//! - [`SessionGate`] serializes turns per conversation so a double-submit
//!   never runs two pipelines over the same session state;
//! - [`BookingTools`] exposes the two tool entry points the agent calls
//!   ([`BookingTools::check_availability`], [`BookingTools::create_booking`]);
//! - [`TenantContextService`] assembles the cached prompt inputs
//!   (business context, FAQs, catalogs, schedule rendering);
//! - [`AgentCache`] keeps one compiled agent per tenant behind a
//!   single-flight lock, built through the [`AgentFactory`] seam;
//! - [`with_turn_timeout`] bounds the whole turn pipeline, mapping expiry
//!   to a timeout-specific user message.

pub mod agent_cache;
pub mod context;
pub mod session;
pub mod tools;

use std::time::Duration;

use agendio_core::AgendioError;

pub use agent_cache::{AgentCache, AgentFactory};
pub use context::{ContextSettings, PromptContext, TenantContextService};
pub use session::SessionGate;
pub use tools::{BookingTools, ToolContext};

/// Bounds a whole conversational turn. Work already issued upstream is
/// not cancelled (fire-and-forget) and may still complete after the
/// caller has given up.
pub async fn with_turn_timeout<T, Fut>(limit: Duration, turn: Fut) -> Result<T, AgendioError>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(limit, turn)
        .await
        .map_err(|_| AgendioError::Timeout { duration: limit })
}

/// The user-facing message for an expired turn.
pub fn timeout_reply(limit: Duration) -> String {
    format!(
        "La solicitud tardó más de {}s. Por favor, intenta de nuevo.",
        limit.as_secs()
    )
}
