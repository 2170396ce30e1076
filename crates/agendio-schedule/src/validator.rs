// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slot validation against a tenant's weekly schedule and live calendar.
//!
//! [`ScheduleService`] owns the per-process shared state: the single-flight
//! schedule cache, the suggestion cache, and the resilient gateway for the
//! information endpoint. [`ScheduleValidator`] is a cheap per-invocation
//! view binding a tenant and its booking options to the service.

use std::sync::Arc;
use std::time::Duration;

use agendio_cache::SingleFlightCache;
use agendio_core::{AgendioError, TenantId, UpstreamError};
use agendio_resilience::{CircuitBreaker, ResilientGateway, RetryPolicy};
use agendio_upstream::{ApiClient, AvailabilityQuery, SuggestQuery, SuggestResponse};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::blackout::is_window_blocked;
use crate::model::{day_name, format_time_12h, parse_time, DayHours, WeeklySchedule};

/// Outcome of a full slot validation; `reason` is user-facing Spanish text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub reason: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Outcome of a live calendar availability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityResult {
    pub available: bool,
    pub reason: Option<String>,
}

impl AvailabilityResult {
    pub fn free() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    pub fn occupied(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

/// Tuning for the schedule service's caches, retries, and breaker.
#[derive(Debug, Clone)]
pub struct ScheduleSettings {
    /// Tenant timezone; "now" comparisons happen here, not in server time.
    pub timezone: Tz,
    /// TTL of the weekly-schedule cache.
    pub schedule_ttl: Duration,
    /// TTL of the slot-suggestion cache (short: suggestions go stale fast).
    pub suggestion_ttl: Duration,
    /// Advisory cache capacity per kind.
    pub max_entries: usize,
    /// Fetch-lock registry size that triggers pruning.
    pub lock_cleanup_threshold: usize,
    /// Retry bounds for schedule reads.
    pub retry: RetryPolicy,
    /// Failures within the window that open the information-endpoint breaker.
    pub breaker_threshold: u32,
    /// Failure-counting window.
    pub breaker_window: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Lima,
            schedule_ttl: Duration::from_secs(300),
            suggestion_ttl: Duration::from_secs(60),
            max_entries: 500,
            lock_cleanup_threshold: 500,
            retry: RetryPolicy::default(),
            breaker_threshold: 3,
            breaker_window: Duration::from_secs(300),
        }
    }
}

impl ScheduleSettings {
    /// Settings from the loaded configuration. Fails only when the
    /// configured timezone does not resolve (config validation normally
    /// catches that earlier).
    pub fn from_config(config: &agendio_config::AgendioConfig) -> Result<Self, AgendioError> {
        let timezone = config
            .agent
            .timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| {
                AgendioError::Config(format!(
                    "invalid timezone `{}`",
                    config.agent.timezone
                ))
            })?;
        Ok(Self {
            timezone,
            schedule_ttl: Duration::from_secs(config.cache.schedule_ttl_secs),
            suggestion_ttl: Duration::from_secs(config.cache.suggestion_ttl_secs),
            max_entries: config.cache.max_entries,
            lock_cleanup_threshold: config.cache.lock_cleanup_threshold,
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts,
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                max_delay: Duration::from_millis(config.retry.max_delay_ms),
            },
            breaker_threshold: config.breaker.failure_threshold,
            breaker_window: Duration::from_secs(config.breaker.window_secs),
        })
    }
}

/// Shared schedule state for one process: caches, gateway, timezone.
#[derive(Debug)]
pub struct ScheduleService {
    client: Arc<ApiClient>,
    timezone: Tz,
    schedule_cache: SingleFlightCache<TenantId, WeeklySchedule>,
    suggestion_cache: SingleFlightCache<TenantId, SuggestResponse>,
    gateway: ResilientGateway<TenantId>,
}

impl ScheduleService {
    pub fn new(client: Arc<ApiClient>, settings: ScheduleSettings) -> Self {
        Self {
            client,
            timezone: settings.timezone,
            schedule_cache: SingleFlightCache::new(
                settings.schedule_ttl,
                settings.max_entries,
                settings.lock_cleanup_threshold,
            ),
            suggestion_cache: SingleFlightCache::new(
                settings.suggestion_ttl,
                settings.max_entries,
                settings.lock_cleanup_threshold,
            ),
            gateway: ResilientGateway::new(
                settings.retry,
                CircuitBreaker::new(settings.breaker_threshold, settings.breaker_window),
            ),
        }
    }

    /// The tenant timezone used for every "now" comparison.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Current wall-clock in the tenant timezone, naive local.
    pub fn now_local(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    /// A tenant's weekly schedule, via the single-flight cache and the
    /// resilient gateway. Concurrent cold callers trigger one fetch.
    pub async fn weekly_schedule(
        &self,
        tenant_id: TenantId,
    ) -> Result<WeeklySchedule, UpstreamError> {
        self.schedule_cache
            .get_or_fetch(&tenant_id, || async move {
                let raw = self
                    .gateway
                    .read(&tenant_id, || self.client.fetch_weekly_schedule(tenant_id))
                    .await?;
                Ok(WeeklySchedule::from_raw(raw))
            })
            .await
    }

    /// Slot suggestions for today/tomorrow, single-flighted per tenant so a
    /// burst of concurrent `recommend` calls makes one upstream call.
    pub async fn suggestions(
        &self,
        tenant_id: TenantId,
        query: &SuggestQuery,
    ) -> Result<SuggestResponse, UpstreamError> {
        self.suggestion_cache
            .get_or_fetch(&tenant_id, || async move {
                self.client.suggest_slots(query).await
            })
            .await
    }

    /// The weekly schedule rendered for prompt injection, degrading to the
    /// stock "no schedule" line when the lookup fails.
    pub async fn schedule_prompt_text(&self, tenant_id: TenantId) -> String {
        match self.weekly_schedule(tenant_id).await {
            Ok(schedule) => schedule.prompt_lines(),
            Err(e) => {
                warn!(tenant_id = %tenant_id, error = %e, "schedule unavailable for prompt");
                "No hay horario cargado.".to_string()
            }
        }
    }

    /// Breaker over the information endpoint, for health reporting.
    pub fn breaker(&self) -> &CircuitBreaker<TenantId> {
        self.gateway.breaker()
    }

    pub(crate) fn api(&self) -> &ApiClient {
        &self.client
    }
}

/// Per-invocation booking options, defaulted the way the orchestrator
/// defaults them.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorOptions {
    pub duration_minutes: u32,
    pub slots: u32,
    pub book_for_assignee: bool,
    pub book_for_branch: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            duration_minutes: 60,
            slots: 60,
            book_for_assignee: true,
            book_for_branch: false,
        }
    }
}

/// Validates requested slots for one tenant.
#[derive(Debug, Clone)]
pub struct ScheduleValidator {
    service: Arc<ScheduleService>,
    tenant_id: TenantId,
    options: ValidatorOptions,
}

impl ScheduleValidator {
    pub fn new(service: Arc<ScheduleService>, tenant_id: TenantId, options: ValidatorOptions) -> Self {
        Self {
            service,
            tenant_id,
            options,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub(crate) fn service(&self) -> &ScheduleService {
        &self.service
    }

    pub(crate) fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Decides whether `(date, time)` is bookable, short-circuiting on the
    /// first failing check. Every rejection reason names the offending day
    /// and window where relevant; reasons are forwarded verbatim to the
    /// end user.
    pub async fn validate(&self, date: &str, time: &str) -> ValidationResult {
        // 1-2. Syntax.
        let Ok(parsed_date) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
            return ValidationResult::reject(
                "Formato de fecha inválido. Usa el formato YYYY-MM-DD (ejemplo: 2026-01-25).",
            );
        };
        let Some(parsed_time) = parse_time(time) else {
            return ValidationResult::reject(
                "Formato de hora inválido. Usa el formato HH:MM AM/PM (ejemplo: 10:30 AM).",
            );
        };

        // 3. No past (or same-instant) bookings, in the tenant timezone.
        let requested = parsed_date.and_time(parsed_time);
        if requested <= self.service.now_local() {
            return ValidationResult::reject(
                "La fecha y hora seleccionada ya pasó. Por favor elige una fecha y hora futura.",
            );
        }

        // 4. Weekly schedule; unavailable means availability cannot be
        // confirmed, never that the slot is illegal.
        let schedule = match self.service.weekly_schedule(self.tenant_id).await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(
                    tenant_id = %self.tenant_id,
                    error = %e,
                    "schedule unavailable, allowing booking"
                );
                return ValidationResult::ok();
            }
        };

        // 5-6. Day entry.
        let weekday = parsed_date.weekday();
        let range = match schedule.day_hours(weekday) {
            DayHours::Missing => {
                return ValidationResult::reject(format!(
                    "No hay horario disponible para el día {}. Por favor elige otro día.",
                    day_name(weekday)
                ));
            }
            DayHours::Closed => {
                return ValidationResult::reject(format!(
                    "No hay atención el día {}. Por favor elige otro día.",
                    day_name(weekday)
                ));
            }
            DayHours::Unparsed => {
                warn!(
                    tenant_id = %self.tenant_id,
                    day = day_name(weekday),
                    "unparseable day range, allowing booking"
                );
                return ValidationResult::ok();
            }
            DayHours::Open(range) => range,
        };

        // 7. Inside the operating window.
        let window = range.display_es();
        if parsed_time < range.open {
            return ValidationResult::reject(format!(
                "La hora seleccionada es antes del horario de atención. El horario del {} es de {}.",
                day_name(weekday),
                window
            ));
        }
        if parsed_time >= range.close {
            return ValidationResult::reject(format!(
                "La hora seleccionada es después del horario de atención. El horario del {} es de {}.",
                day_name(weekday),
                window
            ));
        }

        // 8. The appointment may not run past closing.
        let duration = TimeDelta::minutes(i64::from(self.options.duration_minutes));
        let requested_end = requested + duration;
        let closing = parsed_date.and_time(range.close);
        if requested_end > closing {
            return ValidationResult::reject(format!(
                "La cita de {} minutos excedería el horario de atención (cierre: {}). El horario del {} es de {}. Por favor elige una hora más temprana.",
                self.options.duration_minutes,
                format_time_12h(range.close),
                day_name(weekday),
                window
            ));
        }

        // 9. Blackout windows.
        if let Some(descriptor) = schedule.blackouts()
            && is_window_blocked(parsed_date, parsed_time, requested_end.time(), descriptor)
        {
            return ValidationResult::reject(
                "El horario seleccionado está bloqueado. Por favor elige otra hora.",
            );
        }

        // 10. Live calendar.
        let availability = self.check_availability(date, time).await;
        if !availability.available {
            return ValidationResult::reject(
                availability
                    .reason
                    .unwrap_or_else(|| "El horario seleccionado no está disponible.".to_string()),
            );
        }

        debug!(tenant_id = %self.tenant_id, date, time, "slot validated");
        ValidationResult::ok()
    }

    /// Checks the `[start, start+duration)` window against the live booking
    /// calendar. On any upstream failure the slot is treated as available:
    /// a transient outage must not block the user.
    pub async fn check_availability(&self, date: &str, time: &str) -> AvailabilityResult {
        let Ok(parsed_date) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") else {
            return AvailabilityResult::free();
        };
        let Some(parsed_time) = parse_time(time) else {
            return AvailabilityResult::free();
        };

        let start = parsed_date.and_time(parsed_time);
        let end = start + TimeDelta::minutes(i64::from(self.options.duration_minutes));
        let query = AvailabilityQuery {
            tenant_id: self.tenant_id.0,
            fecha_inicio: start.format("%Y-%m-%d %H:%M:%S").to_string(),
            fecha_fin: end.format("%Y-%m-%d %H:%M:%S").to_string(),
            slots: self.options.slots,
            book_for_assignee: self.options.book_for_assignee,
            book_for_branch: self.options.book_for_branch,
        };

        match self.service.api().check_window(&query).await {
            Ok(true) => AvailabilityResult::free(),
            Ok(false) => AvailabilityResult::occupied(
                "El horario seleccionado ya está ocupado. Por favor elige otra hora o fecha.",
            ),
            Err(e) => {
                warn!(
                    tenant_id = %self.tenant_id,
                    error = %e,
                    "availability check failed, treating slot as free"
                );
                AvailabilityResult::free()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agendio_test_utils::MockBusinessApi;
    use chrono::Weekday;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn service_for(api: &MockBusinessApi) -> Arc<ScheduleService> {
        Arc::new(ScheduleService::new(
            Arc::new(api.client()),
            ScheduleSettings::default(),
        ))
    }

    fn validator_for(api: &MockBusinessApi) -> ScheduleValidator {
        ScheduleValidator::new(service_for(api), TenantId(7), ValidatorOptions::default())
    }

    /// First date strictly after today (tenant tz) falling on `weekday`,
    /// so requested slots are always in the future.
    fn next_date(weekday: Weekday) -> String {
        let mut date = Utc::now()
            .with_timezone(&chrono_tz::America::Lima)
            .date_naive()
            + TimeDelta::days(1);
        while date.weekday() != weekday {
            date += TimeDelta::days(1);
        }
        date.format("%Y-%m-%d").to_string()
    }

    #[tokio::test]
    async fn rejects_malformed_date_before_any_network() {
        let api = MockBusinessApi::start().await;
        let result = validator_for(&api).validate("27/01/2026", "10:00 AM").await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn rejects_malformed_time_before_any_network() {
        let api = MockBusinessApi::start().await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "a mediodía")
            .await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("HH:MM"));
    }

    #[tokio::test]
    async fn rejects_past_instants_regardless_of_schedule() {
        let api = MockBusinessApi::start().await;
        let result = validator_for(&api).validate("2020-01-01", "10:00 AM").await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("ya pasó"));
    }

    #[tokio::test]
    async fn rejects_cerrado_sunday_naming_the_day() {
        let api = MockBusinessApi::start().await;
        api.mount_schedule_days(&[
            "09:00-18:00",
            "09:00-18:00",
            "09:00-18:00",
            "09:00-18:00",
            "09:00-18:00",
            "09:00-13:00",
            "CERRADO",
        ])
        .await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Sun), "10:00 AM")
            .await;
        assert!(!result.valid);
        let reason = result.reason.unwrap();
        assert!(reason.contains("domingo"), "reason must name the day: {reason}");
    }

    #[tokio::test]
    async fn rejects_missing_day_with_day_specific_message() {
        let api = MockBusinessApi::start().await;
        api.mount_schedule_days(&["09:00-18:00", "", "", "", "", "", ""]).await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Tue), "10:00 AM")
            .await;
        assert!(!result.valid);
        let reason = result.reason.unwrap();
        assert!(reason.contains("No hay horario disponible"));
        assert!(reason.contains("martes"));
    }

    #[tokio::test]
    async fn rejects_time_before_opening() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "08:00 AM")
            .await;
        assert!(!result.valid);
        let reason = result.reason.unwrap();
        assert!(reason.contains("antes del horario"));
        assert!(reason.contains("lunes"));
        assert!(reason.contains("09:00 AM a 06:00 PM"));
    }

    #[tokio::test]
    async fn rejects_time_at_or_after_close() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "06:00 PM")
            .await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("después del horario"));
    }

    #[tokio::test]
    async fn rejects_appointment_running_past_closing() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        // 17:30 + 60 min overruns the 18:00 close even though it starts
        // in-hours.
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "05:30 PM")
            .await;
        assert!(!result.valid);
        let reason = result.reason.unwrap();
        assert!(reason.contains("excedería"));
        assert!(reason.contains("cierre: 06:00 PM"));
        assert!(reason.contains("60 minutos"));
    }

    #[tokio::test]
    async fn accepts_valid_slot_inside_hours() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Wed), "10:30 AM")
            .await;
        assert!(result.valid, "unexpected rejection: {:?}", result.reason);
    }

    #[tokio::test]
    async fn fails_open_when_schedule_endpoint_is_down() {
        let api = MockBusinessApi::start().await;
        api.mount_schedule_error(500).await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "03:00 AM")
            .await;
        assert!(result.valid);
    }

    #[tokio::test]
    async fn fails_open_on_unparseable_day_range() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("horario raro").await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "10:00 AM")
            .await;
        assert!(result.valid);
    }

    #[tokio::test]
    async fn rejects_blacked_out_window() {
        let api = MockBusinessApi::start().await;
        let date = next_date(Weekday::Thu);
        api.mount_schedule_with_blackouts(
            &[
                "09:00-18:00",
                "09:00-18:00",
                "09:00-18:00",
                "09:00-18:00",
                "09:00-18:00",
                "09:00-18:00",
                "09:00-18:00",
            ],
            json!([{"fecha": date, "inicio": "13:00", "fin": "14:00"}]),
        )
        .await;
        let result = validator_for(&api).validate(&date, "01:30 PM").await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("bloqueado"));
    }

    #[tokio::test]
    async fn rejects_occupied_slot_from_live_calendar() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(false).await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Fri), "10:00 AM")
            .await;
        assert!(!result.valid);
        assert!(result.reason.unwrap().contains("ocupado"));
    }

    #[tokio::test]
    async fn availability_outage_fails_open() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability_error(503).await;
        let result = validator_for(&api)
            .validate(&next_date(Weekday::Mon), "10:00 AM")
            .await;
        assert!(result.valid);
    }

    #[tokio::test]
    async fn concurrent_validations_fetch_schedule_once() {
        let api = MockBusinessApi::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(
                json!({"codOpe": "OBTENER_HORARIO_REUNIONES"}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "horario_reuniones": {
                        "reunion_lunes": "09:00-18:00", "reunion_martes": "09:00-18:00",
                        "reunion_miercoles": "09:00-18:00", "reunion_jueves": "09:00-18:00",
                        "reunion_viernes": "09:00-18:00", "reunion_sabado": "09:00-18:00",
                        "reunion_domingo": "09:00-18:00"
                    }
                })),
            )
            .expect(1)
            .mount(api.server())
            .await;
        api.mount_availability(true).await;

        let service = service_for(&api);
        let date = next_date(Weekday::Mon);
        let make = |time: &'static str| {
            let v = ScheduleValidator::new(
                Arc::clone(&service),
                TenantId(7),
                ValidatorOptions::default(),
            );
            let date = date.clone();
            async move { v.validate(&date, time).await }
        };
        let (a, b, c) = tokio::join!(make("10:00 AM"), make("11:00 AM"), make("12:00 PM"));
        assert!(a.valid && b.valid && c.valid);
        // The expect(1) on the schedule mock verifies single-flight on drop.
    }
}
