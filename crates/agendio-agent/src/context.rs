// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant context assembly for system-prompt construction.
//!
//! The external agent's prompt is built from four upstream lookups:
//! business-context text, the FAQ set, product/service names, and the
//! weekly schedule rendering. Context and FAQs change rarely, so they sit
//! behind long-TTL single-flight caches with a circuit breaker per
//! endpoint; catalog names are fetched per assembly and degrade to empty
//! lists. Every path here is prompt-enriching only -- failures degrade,
//! never block a conversation.

use std::sync::Arc;
use std::time::Duration;

use agendio_cache::SingleFlightCache;
use agendio_core::TenantId;
use agendio_resilience::{CircuitBreaker, ResilientGateway, RetryPolicy};
use agendio_schedule::ScheduleService;
use agendio_upstream::{ApiClient, FaqItem};
use tracing::{debug, info, warn};

/// Tuning for the tenant-context caches and their breakers.
#[derive(Debug, Clone)]
pub struct ContextSettings {
    /// TTL for the business-context cache.
    pub context_ttl: Duration,
    /// TTL for the FAQ cache.
    pub faq_ttl: Duration,
    /// Advisory cache capacity per kind.
    pub max_entries: usize,
    /// Fetch-lock registry size that triggers pruning.
    pub lock_cleanup_threshold: usize,
    /// Retry bounds for the cached reads.
    pub retry: RetryPolicy,
    /// Failures within the window that open an endpoint's breaker.
    pub breaker_threshold: u32,
    /// Failure-counting window.
    pub breaker_window: Duration,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            context_ttl: Duration::from_secs(3600),
            faq_ttl: Duration::from_secs(3600),
            max_entries: 500,
            lock_cleanup_threshold: 500,
            retry: RetryPolicy::default(),
            breaker_threshold: 3,
            breaker_window: Duration::from_secs(300),
        }
    }
}

impl ContextSettings {
    /// Settings from the loaded configuration.
    pub fn from_config(config: &agendio_config::AgendioConfig) -> Self {
        Self {
            context_ttl: Duration::from_secs(config.cache.context_ttl_secs),
            faq_ttl: Duration::from_secs(config.cache.faq_ttl_secs),
            max_entries: config.cache.max_entries,
            lock_cleanup_threshold: config.cache.lock_cleanup_threshold,
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                max_delay: Duration::from_millis(config.retry.max_delay_ms),
            },
            breaker_threshold: config.breaker.failure_threshold,
            breaker_window: Duration::from_secs(config.breaker.window_secs),
        }
    }
}

/// Everything the prompt builder needs for one tenant.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Free-text business description, when the tenant loaded one.
    pub business_context: Option<String>,
    /// FAQ set formatted as `Pregunta:` / `Respuesta:` blocks; empty when
    /// none are configured or the lookup degraded.
    pub faqs: String,
    pub product_names: Vec<String>,
    pub service_names: Vec<String>,
    /// Per-day schedule listing, or the stock "no schedule" line.
    pub schedule_text: String,
}

/// Cached, breaker-protected fetchers for tenant prompt data.
#[derive(Debug)]
pub struct TenantContextService {
    client: Arc<ApiClient>,
    context_cache: SingleFlightCache<TenantId, String>,
    context_gateway: ResilientGateway<TenantId>,
    faq_cache: SingleFlightCache<i64, String>,
    faq_gateway: ResilientGateway<i64>,
}

impl TenantContextService {
    pub fn new(client: Arc<ApiClient>, settings: ContextSettings) -> Self {
        Self {
            client,
            context_cache: SingleFlightCache::new(
                settings.context_ttl,
                settings.max_entries,
                settings.lock_cleanup_threshold,
            ),
            context_gateway: ResilientGateway::new(
                settings.retry,
                CircuitBreaker::new(settings.breaker_threshold, settings.breaker_window),
            ),
            faq_cache: SingleFlightCache::new(
                settings.faq_ttl,
                settings.max_entries,
                settings.lock_cleanup_threshold,
            ),
            faq_gateway: ResilientGateway::new(
                settings.retry,
                CircuitBreaker::new(settings.breaker_threshold, settings.breaker_window),
            ),
        }
    }

    /// The tenant's business-context text, or `None` when absent or the
    /// lookup degraded. Empty responses are cached too, so a tenant
    /// without context does not re-poll the endpoint on every message.
    pub async fn business_context(&self, tenant_id: TenantId) -> Option<String> {
        let fetched = self
            .context_cache
            .get_or_fetch(&tenant_id, || async move {
                self.context_gateway
                    .read(&tenant_id, || self.client.fetch_business_context(tenant_id))
                    .await
            })
            .await;
        match fetched {
            Ok(context) => {
                debug!(
                    tenant_id = %tenant_id,
                    chars = context.len(),
                    "business context ready"
                );
                (!context.is_empty()).then_some(context)
            }
            Err(e) => {
                info!(tenant_id = %tenant_id, error = %e, "business context unavailable");
                None
            }
        }
    }

    /// The chatbot's FAQ set formatted for the prompt, or empty when none
    /// exist or the lookup degraded.
    pub async fn faqs(&self, chatbot_id: i64) -> String {
        let fetched = self
            .faq_cache
            .get_or_fetch(&chatbot_id, || async move {
                let items = self
                    .faq_gateway
                    .read(&chatbot_id, || self.client.fetch_faqs(chatbot_id))
                    .await?;
                Ok::<_, agendio_core::UpstreamError>(format_faqs_for_prompt(&items))
            })
            .await;
        match fetched {
            Ok(formatted) => formatted,
            Err(e) => {
                info!(chatbot_id, error = %e, "FAQ set unavailable");
                String::new()
            }
        }
    }

    /// Assembles the full prompt context for a tenant, running the four
    /// lookups concurrently.
    pub async fn assemble(
        &self,
        tenant_id: TenantId,
        chatbot_id: Option<i64>,
        schedule: &ScheduleService,
    ) -> PromptContext {
        let (business_context, faqs, catalogs, schedule_text) = futures::join!(
            self.business_context(tenant_id),
            async {
                match chatbot_id {
                    Some(id) => self.faqs(id).await,
                    None => String::new(),
                }
            },
            self.client.fetch_catalog_names(tenant_id),
            schedule.schedule_prompt_text(tenant_id),
        );
        let (product_names, service_names) = catalogs;
        if business_context.is_none() {
            warn!(tenant_id = %tenant_id, "assembling prompt without business context");
        }
        PromptContext {
            business_context,
            faqs,
            product_names,
            service_names,
            schedule_text,
        }
    }

    /// True when any context endpoint breaker is currently open.
    pub fn any_breaker_open(&self) -> bool {
        self.context_gateway.breaker().any_open() || self.faq_gateway.breaker().any_open()
    }
}

/// Formats FAQ pairs as labeled blocks the model can quote from:
/// `Pregunta:` / `Respuesta:` lines separated by blank lines.
pub fn format_faqs_for_prompt(items: &[FaqItem]) -> String {
    let mut lines = Vec::new();
    for item in items {
        let pregunta = item.pregunta.trim();
        let respuesta = item.respuesta.trim();
        if pregunta.is_empty() && respuesta.is_empty() {
            continue;
        }
        lines.push(format!(
            "Pregunta: {}",
            if pregunta.is_empty() { "(sin texto)" } else { pregunta }
        ));
        lines.push(format!(
            "Respuesta: {}",
            if respuesta.is_empty() { "(sin texto)" } else { respuesta }
        ));
        lines.push(String::new());
    }
    lines.join("\n").trim_end().to_string()
}
