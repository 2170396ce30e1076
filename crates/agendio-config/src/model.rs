// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Agendio booking agent.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Agendio configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgendioConfig {
    /// Agent identity, timezone, and turn-timeout settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Upstream business API endpoints and timeouts.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Retry/backoff bounds for idempotent upstream reads.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Circuit-breaker thresholds for degraded upstream endpoints.
    #[serde(default)]
    pub breaker: BreakerConfig,

    /// Cache TTLs and registry bounds.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Booking defaults applied when the orchestrator omits them.
    #[serde(default)]
    pub booking: BookingConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// IANA timezone for tenant-local date/time reasoning.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Personality descriptor injected into the agent prompt.
    #[serde(default = "default_personality")]
    pub personality: String,

    /// Overall deadline for one conversational turn, in seconds.
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            timezone: default_timezone(),
            personality: default_personality(),
            chat_timeout_secs: default_chat_timeout_secs(),
        }
    }
}

fn default_agent_name() -> String {
    "agendio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timezone() -> String {
    "America/Lima".to_string()
}

fn default_personality() -> String {
    "amable, profesional y eficiente".to_string()
}

fn default_chat_timeout_secs() -> u64 {
    90
}

/// Upstream business API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// Information endpoint (schedules, business context, catalogs).
    #[serde(default = "default_info_url")]
    pub info_url: String,

    /// Booking endpoint (availability checks, slot suggestions).
    #[serde(default = "default_booking_url")]
    pub booking_url: String,

    /// Calendar endpoint (event creation).
    #[serde(default = "default_calendar_url")]
    pub calendar_url: String,

    /// FAQ endpoint.
    #[serde(default = "default_faq_url")]
    pub faq_url: String,

    /// TCP connect deadline, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Deadline for read calls, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Deadline for the calendar write, in seconds. Longer than reads;
    /// the write is never retried, so it gets more room to finish.
    #[serde(default = "default_booking_timeout_secs")]
    pub booking_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            info_url: default_info_url(),
            booking_url: default_booking_url(),
            calendar_url: default_calendar_url(),
            faq_url: default_faq_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            booking_timeout_secs: default_booking_timeout_secs(),
        }
    }
}

fn default_info_url() -> String {
    "https://api.agendio.pe/servicio/ws_informacion_ia.php".to_string()
}

fn default_booking_url() -> String {
    "https://api.agendio.pe/servicio/ws_agendar_reunion.php".to_string()
}

fn default_calendar_url() -> String {
    "https://api.agendio.pe/servicio/ws_calendario.php".to_string()
}

fn default_faq_url() -> String {
    "https://api.agendio.pe/servicio/ws_preguntas_frecuentes.php".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_booking_timeout_secs() -> u64 {
    30
}

/// Retry/backoff configuration for idempotent reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts per read, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds; doubles per retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    4000
}

/// Circuit-breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BreakerConfig {
    /// Failures within the window that open a key's circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Failure-counting window, in seconds. Also the passive cooldown: an
    /// open circuit closes again once the window elapses failure-free.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_window_secs() -> u64 {
    300
}

/// Cache TTLs and registry bounds. One cache instance exists per data
/// kind; capacities are advisory (TTL is the only eviction).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Weekly-schedule cache TTL, in seconds.
    #[serde(default = "default_schedule_ttl_secs")]
    pub schedule_ttl_secs: u64,

    /// Slot-suggestion cache TTL, in seconds.
    #[serde(default = "default_suggestion_ttl_secs")]
    pub suggestion_ttl_secs: u64,

    /// Business-context cache TTL, in seconds.
    #[serde(default = "default_context_ttl_secs")]
    pub context_ttl_secs: u64,

    /// FAQ cache TTL, in seconds.
    #[serde(default = "default_faq_ttl_secs")]
    pub faq_ttl_secs: u64,

    /// Compiled-agent cache TTL, in seconds. Independent of the schedule
    /// TTL: prompt inputs change rarely, slot validation stays fresh.
    #[serde(default = "default_agent_ttl_secs")]
    pub agent_ttl_secs: u64,

    /// Advisory entry bound per cache.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Lock-registry size that triggers pruning of idle handles.
    #[serde(default = "default_lock_cleanup_threshold")]
    pub lock_cleanup_threshold: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            schedule_ttl_secs: default_schedule_ttl_secs(),
            suggestion_ttl_secs: default_suggestion_ttl_secs(),
            context_ttl_secs: default_context_ttl_secs(),
            faq_ttl_secs: default_faq_ttl_secs(),
            agent_ttl_secs: default_agent_ttl_secs(),
            max_entries: default_max_entries(),
            lock_cleanup_threshold: default_lock_cleanup_threshold(),
        }
    }
}

fn default_schedule_ttl_secs() -> u64 {
    300
}

fn default_suggestion_ttl_secs() -> u64 {
    60
}

fn default_context_ttl_secs() -> u64 {
    3600
}

fn default_faq_ttl_secs() -> u64 {
    3600
}

fn default_agent_ttl_secs() -> u64 {
    3600
}

fn default_max_entries() -> usize {
    500
}

fn default_lock_cleanup_threshold() -> usize {
    500
}

/// Booking defaults applied when the orchestrator omits the fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    /// Appointment duration in minutes.
    #[serde(default = "default_duration_minutes")]
    pub duration_minutes: u32,

    /// Slot granularity forwarded to the booking endpoint.
    #[serde(default = "default_slots")]
    pub slots: u32,

    /// Assign a seller automatically.
    #[serde(default = "default_book_for_assignee")]
    pub book_for_assignee: bool,

    /// Book against a branch calendar instead of a person.
    #[serde(default)]
    pub book_for_branch: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_duration_minutes(),
            slots: default_slots(),
            book_for_assignee: default_book_for_assignee(),
            book_for_branch: false,
        }
    }
}

fn default_duration_minutes() -> u32 {
    60
}

fn default_slots() -> u32 {
    60
}

fn default_book_for_assignee() -> bool {
    true
}
