// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Agendio booking-agent core.

use thiserror::Error;

/// The primary error type used across Agendio service objects.
#[derive(Debug, Error)]
pub enum AgendioError {
    /// Configuration errors (invalid TOML, missing required fields, bad timezone).
    #[error("configuration error: {0}")]
    Config(String),

    /// A failure talking to an upstream business API.
    #[error("upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Operation timed out (e.g. the whole conversational turn).
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Caller-supplied data failed validation. The message is user-facing.
    #[error("{0}")]
    InvalidInput(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Tagged outcome of a single upstream call, matched exhaustively by callers.
///
/// The split between [`UpstreamError::Timeout`]/[`UpstreamError::Connection`]
/// (transport never reached a well-formed response) and
/// [`UpstreamError::Status`]/[`UpstreamError::Api`] (a reachable server
/// rejected the request) drives the retry policy: only transport failures
/// are worth retrying.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request hit its deadline before a response arrived.
    #[error("upstream request timed out")]
    Timeout,

    /// The connection could not be established or broke mid-request.
    #[error("upstream connection failed: {0}")]
    Connection(String),

    /// The server answered with a non-success HTTP status.
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// A well-formed response reporting an application-level failure.
    #[error("upstream rejected the request: {0}")]
    Api(String),

    /// The response body could not be decoded.
    #[error("malformed upstream response: {0}")]
    Malformed(String),

    /// The circuit breaker is open for this key; no call was attempted.
    #[error("circuit open for {0}")]
    CircuitOpen(String),
}

impl UpstreamError {
    /// Whether a retry could plausibly succeed. Transport-level failures
    /// only; a deterministic rejection retried is time wasted.
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Timeout | UpstreamError::Connection(_))
    }
}
