// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Compiled-agent cache.
//!
//! Building the conversational agent for a tenant is expensive: it pulls
//! the business context, FAQs, catalogs, and schedule, then compiles the
//! external LLM agent around them. The cache keeps one compiled agent per
//! tenant behind a single-flight lock, so a burst of sessions for a new
//! tenant compiles once. The cache key is the tenant id alone; prompt
//! inputs going stale is bounded by the TTL, not by key granularity.

use std::sync::Arc;
use std::time::Duration;

use agendio_cache::SingleFlightCache;
use agendio_core::{AgendioError, TenantId};
use async_trait::async_trait;
use tracing::debug;

/// Seam to the external LLM agent construction. Implementations fetch the
/// tenant's prompt inputs and compile whatever handle the conversational
/// layer invokes per turn.
#[async_trait]
pub trait AgentFactory: Send + Sync {
    type Agent: Send + Sync;

    async fn build(&self, tenant_id: TenantId) -> Result<Self::Agent, AgendioError>;
}

/// Per-tenant single-flight cache of compiled agents.
pub struct AgentCache<F: AgentFactory> {
    factory: F,
    cache: SingleFlightCache<TenantId, Arc<F::Agent>>,
}

impl<F: AgentFactory> AgentCache<F> {
    /// Creates a cache that keeps compiled agents for `ttl`, with the
    /// usual advisory capacity and lock-pruning threshold.
    pub fn new(factory: F, ttl: Duration, max_entries: usize, cleanup_threshold: usize) -> Self {
        Self {
            factory,
            cache: SingleFlightCache::new(ttl, max_entries, cleanup_threshold),
        }
    }

    /// Cache sized from the `[cache]` config section (`agent_ttl_secs`).
    pub fn from_config(factory: F, config: &agendio_config::AgendioConfig) -> Self {
        Self::new(
            factory,
            Duration::from_secs(config.cache.agent_ttl_secs),
            config.cache.max_entries,
            config.cache.lock_cleanup_threshold,
        )
    }

    /// The compiled agent for a tenant, building it on first use. N
    /// concurrent sessions of a cold tenant trigger exactly one build; a
    /// failed build is re-raised and the next caller retries.
    pub async fn get(&self, tenant_id: TenantId) -> Result<Arc<F::Agent>, AgendioError> {
        self.cache
            .get_or_fetch(&tenant_id, || async move {
                debug!(tenant_id = %tenant_id, "compiling agent");
                Ok(Arc::new(self.factory.build(tenant_id).await?))
            })
            .await
    }

    /// Drops every compiled agent (e.g. after a tenant config change).
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of compiled agents currently cached.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// True when no agents are cached.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
