// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./agendio.toml` > `~/.config/agendio/agendio.toml` > `/etc/agendio/agendio.toml`
//! with environment variable overrides via `AGENDIO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::AgendioConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/agendio/agendio.toml` (system-wide)
/// 3. `~/.config/agendio/agendio.toml` (user XDG config)
/// 4. `./agendio.toml` (local directory)
/// 5. `AGENDIO_*` environment variables
pub fn load_config() -> Result<AgendioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgendioConfig::default()))
        .merge(Toml::file("/etc/agendio/agendio.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("agendio/agendio.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("agendio.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<AgendioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgendioConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<AgendioConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(AgendioConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `AGENDIO_UPSTREAM_INFO_URL` must map
/// to `upstream.info_url`, not `upstream.info.url`.
fn env_provider() -> Env {
    Env::prefixed("AGENDIO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: AGENDIO_UPSTREAM_INFO_URL -> "upstream_info_url"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("upstream_", "upstream.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("breaker_", "breaker.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("booking_", "booking.", 1);
        mapped.into()
    })
}
