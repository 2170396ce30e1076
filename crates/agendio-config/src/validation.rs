// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: a resolvable IANA timezone, http(s) endpoint URLs, and
//! non-degenerate retry/breaker/cache bounds.

use std::str::FromStr;

use crate::diagnostic::ConfigError;
use crate::model::AgendioConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &AgendioConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Timezone must resolve to an IANA zone.
    if chrono_tz::Tz::from_str(config.agent.timezone.trim()).is_err() {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.timezone `{}` is not a valid IANA timezone",
                config.agent.timezone
            ),
        });
    }

    // Endpoint URLs must be non-empty http(s).
    for (key, url) in [
        ("upstream.info_url", &config.upstream.info_url),
        ("upstream.booking_url", &config.upstream.booking_url),
        ("upstream.calendar_url", &config.upstream.calendar_url),
        ("upstream.faq_url", &config.upstream.faq_url),
    ] {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        } else if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{trimmed}` must start with http:// or https://"),
            });
        }
    }

    if config.agent.chat_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "agent.chat_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.retry.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if config.retry.max_delay_ms < config.retry.base_delay_ms {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.max_delay_ms ({}) must be >= retry.base_delay_ms ({})",
                config.retry.max_delay_ms, config.retry.base_delay_ms
            ),
        });
    }

    if config.breaker.failure_threshold == 0 {
        errors.push(ConfigError::Validation {
            message: "breaker.failure_threshold must be at least 1".to_string(),
        });
    }

    if config.breaker.window_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "breaker.window_secs must be at least 1".to_string(),
        });
    }

    for (key, ttl) in [
        ("cache.schedule_ttl_secs", config.cache.schedule_ttl_secs),
        ("cache.suggestion_ttl_secs", config.cache.suggestion_ttl_secs),
        ("cache.context_ttl_secs", config.cache.context_ttl_secs),
        ("cache.faq_ttl_secs", config.cache.faq_ttl_secs),
        ("cache.agent_ttl_secs", config.cache.agent_ttl_secs),
    ] {
        if ttl == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1"),
            });
        }
    }

    if config.booking.duration_minutes == 0 {
        errors.push(ConfigError::Validation {
            message: "booking.duration_minutes must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
