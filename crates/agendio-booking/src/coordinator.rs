// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The booking coordinator: validate, then write once.

use std::sync::Arc;

use agendio_core::{ProspectId, SessionId, TenantId, UpstreamError};
use agendio_schedule::{parse_time, ScheduleService, ScheduleValidator, ValidatorOptions};
use agendio_upstream::{ApiClient, CreateEventRequest};
use chrono::{NaiveDate, TimeDelta};
use tracing::{debug, info, warn};

use crate::input::validate_booking_input;

/// Everything needed to create one calendar event. Constructed per tool
/// invocation from agent-supplied fields plus the tenant context; not
/// persisted beyond the call.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub prospect_id: ProspectId,
    /// Service or meeting motive, used in the event title.
    pub service_name: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM AM/PM` or 24-hour.
    pub time: String,
    pub duration_minutes: u32,
    pub customer_name: String,
    pub customer_email: String,
    /// Seller/assignee registering the appointment.
    pub assignee_user_id: i64,
    pub assignee_email: String,
    pub book_for_assignee: bool,
    pub book_for_branch: bool,
    pub slots: u32,
}

/// Reason code attached to failed bookings, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingErrorKind {
    Timeout,
    Http(u16),
    ConnectionError,
    ApiError,
    InvalidDatetime,
    UnknownError,
}

impl std::fmt::Display for BookingErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingErrorKind::Timeout => write!(f, "timeout"),
            BookingErrorKind::Http(status) => write!(f, "http_{status}"),
            BookingErrorKind::ConnectionError => write!(f, "connection_error"),
            BookingErrorKind::ApiError => write!(f, "api_error"),
            BookingErrorKind::InvalidDatetime => write!(f, "invalid_datetime"),
            BookingErrorKind::UnknownError => write!(f, "unknown_error"),
        }
    }
}

/// Which validation stage turned a request down before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionStage {
    /// Field-level input validation (email, name, date, time syntax).
    Input,
    /// Slot validation against schedule/blackouts/live calendar.
    Slot,
}

/// Typed result of a booking attempt. `message` is user-facing; a
/// rejection carries its stage and no `error_kind` (only write failures
/// get a reason code).
#[derive(Debug, Clone)]
pub struct BookingOutcome {
    pub success: bool,
    pub message: String,
    pub meeting_link: Option<String>,
    /// Whether the downstream calendar sync also succeeded; lets the
    /// caller choose between "here is your video link" and "booked, link
    /// pending".
    pub calendar_synced: Option<bool>,
    pub rejection: Option<RejectionStage>,
    pub error_kind: Option<BookingErrorKind>,
}

impl BookingOutcome {
    fn rejected(stage: RejectionStage, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            meeting_link: None,
            calendar_synced: None,
            rejection: Some(stage),
            error_kind: None,
        }
    }

    fn failed(message: impl Into<String>, kind: BookingErrorKind) -> Self {
        Self {
            success: false,
            message: message.into(),
            meeting_link: None,
            calendar_synced: None,
            rejection: None,
            error_kind: Some(kind),
        }
    }
}

/// Orchestrates validation and the single calendar write.
#[derive(Debug, Clone)]
pub struct BookingCoordinator {
    client: Arc<ApiClient>,
    schedule: Arc<ScheduleService>,
}

impl BookingCoordinator {
    pub fn new(client: Arc<ApiClient>, schedule: Arc<ScheduleService>) -> Self {
        Self { client, schedule }
    }

    /// Creates one calendar event for a validated request.
    ///
    /// Order: input shape, slot validation (fail-open reads), then exactly
    /// one `CREAR_EVENTO` write. The write is never retried -- on failure
    /// the caller decides whether to ask the user to try again.
    pub async fn create(&self, request: &BookingRequest) -> BookingOutcome {
        let input = match validate_booking_input(
            &request.date,
            &request.time,
            &request.customer_name,
            &request.customer_email,
            self.schedule.timezone(),
        ) {
            Ok(input) => input,
            Err(reason) => {
                warn!(
                    tenant_id = %request.tenant_id,
                    reason = %reason,
                    "booking input rejected"
                );
                return BookingOutcome::rejected(RejectionStage::Input, reason);
            }
        };

        let validator = ScheduleValidator::new(
            Arc::clone(&self.schedule),
            request.tenant_id,
            ValidatorOptions {
                duration_minutes: request.duration_minutes,
                slots: request.slots,
                book_for_assignee: request.book_for_assignee,
                book_for_branch: request.book_for_branch,
            },
        );
        let validation = validator.validate(&input.date, &input.time).await;
        if !validation.valid {
            let reason = validation
                .reason
                .unwrap_or_else(|| "El horario seleccionado no es válido.".to_string());
            debug!(tenant_id = %request.tenant_id, reason = %reason, "slot rejected");
            return BookingOutcome::rejected(RejectionStage::Slot, reason);
        }

        let Some((fecha_inicio, fecha_fin)) =
            event_window(&input.date, &input.time, request.duration_minutes)
        else {
            return BookingOutcome::failed(
                "Formato de fecha u hora inválido",
                BookingErrorKind::InvalidDatetime,
            );
        };

        // The prospect defaults to the session when the orchestrator did
        // not resolve one.
        let prospect_id = if request.prospect_id.0 > 0 {
            request.prospect_id.0
        } else {
            request.session_id.0
        };

        let event = CreateEventRequest::new(
            request.assignee_user_id,
            prospect_id,
            format!("Reunion para el usuario: {}", input.customer_name),
            fecha_inicio,
            fecha_fin,
            input.customer_email.clone(),
            request.assignee_email.trim().to_string(),
            request.book_for_assignee,
        );

        match self.client.create_event(&event).await {
            Ok(response) if response.success => {
                let message = response
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Evento creado correctamente".to_string());
                info!(
                    tenant_id = %request.tenant_id,
                    session_id = %request.session_id,
                    synced = response.google_calendar_synced.unwrap_or(false),
                    "calendar event created"
                );
                BookingOutcome {
                    success: true,
                    message,
                    meeting_link: response.google_meet_link,
                    calendar_synced: Some(response.google_calendar_synced.unwrap_or(false)),
                    rejection: None,
                    error_kind: None,
                }
            }
            Ok(response) => {
                let message = response
                    .message
                    .or(response.error)
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Error desconocido".to_string());
                warn!(tenant_id = %request.tenant_id, message = %message, "calendar rejected event");
                BookingOutcome::failed(message, BookingErrorKind::ApiError)
            }
            Err(UpstreamError::Timeout) => {
                warn!(tenant_id = %request.tenant_id, "calendar write timed out");
                BookingOutcome::failed(
                    "La conexión tardó demasiado tiempo",
                    BookingErrorKind::Timeout,
                )
            }
            Err(UpstreamError::Status(status)) => {
                warn!(tenant_id = %request.tenant_id, status, "calendar write HTTP error");
                BookingOutcome::failed(
                    format!("Error del servidor ({status})"),
                    BookingErrorKind::Http(status),
                )
            }
            Err(UpstreamError::Connection(detail)) => {
                warn!(tenant_id = %request.tenant_id, detail = %detail, "calendar write connection error");
                BookingOutcome::failed(
                    "Error al conectar con el servidor",
                    BookingErrorKind::ConnectionError,
                )
            }
            Err(e) => {
                warn!(tenant_id = %request.tenant_id, error = %e, "calendar write failed unexpectedly");
                BookingOutcome::failed(
                    "Error inesperado al crear el evento",
                    BookingErrorKind::UnknownError,
                )
            }
        }
    }
}

/// `(fecha_inicio, fecha_fin)` in `YYYY-MM-DD HH:MM:SS`, end = start +
/// duration.
fn event_window(date: &str, time: &str, duration_minutes: u32) -> Option<(String, String)> {
    let parsed_date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let parsed_time = parse_time(time)?;
    let start = parsed_date.and_time(parsed_time);
    let end = start + TimeDelta::minutes(i64::from(duration_minutes));
    Some((
        start.format("%Y-%m-%d %H:%M:%S").to_string(),
        end.format("%Y-%m-%d %H:%M:%S").to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use agendio_schedule::ScheduleSettings;
    use agendio_test_utils::MockBusinessApi;
    use chrono::{Datelike, Utc, Weekday};

    fn coordinator_for(api: &MockBusinessApi) -> BookingCoordinator {
        let client = Arc::new(api.client());
        let schedule = Arc::new(ScheduleService::new(
            Arc::clone(&client),
            ScheduleSettings::default(),
        ));
        BookingCoordinator::new(client, schedule)
    }

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

    fn request(date: String, time: &str) -> BookingRequest {
        BookingRequest {
            tenant_id: TenantId(7),
            session_id: SessionId(1001),
            prospect_id: ProspectId(42),
            service_name: "demostración".into(),
            date,
            time: time.into(),
            duration_minutes: 60,
            customer_name: "Ana Pérez".into(),
            customer_email: "ana@ejemplo.com".into(),
            assignee_user_id: 1,
            assignee_email: "vendedor@ejemplo.com".into(),
            book_for_assignee: true,
            book_for_branch: false,
            slots: 60,
        }
    }

    #[tokio::test]
    async fn invalid_email_rejected_without_any_network() {
        let api = MockBusinessApi::start().await;
        // No mocks mounted: any HTTP call would fail the test via 404s
        // showing up as a write error kind.
        let mut req = request(next_date(Weekday::Mon), "10:00 AM");
        req.customer_email = "no-es-email".into();
        let outcome = coordinator_for(&api).create(&req).await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("email válido"));
        assert_eq!(outcome.rejection, Some(RejectionStage::Input));
        assert_eq!(outcome.error_kind, None);
    }

    #[tokio::test]
    async fn slot_rejection_skips_the_write() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("CERRADO").await;
        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Sun), "10:00 AM"))
            .await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("domingo"));
        assert_eq!(outcome.rejection, Some(RejectionStage::Slot));
        assert_eq!(outcome.error_kind, None);
        // No CREAR_EVENTO mock is mounted; wiremock would have answered
        // 404 and produced an http error kind had the write been issued.
    }

    #[tokio::test]
    async fn successful_booking_carries_meet_link_and_sync_flag() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_success(Some("https://meet.google.com/abc-defg-hij"), true)
            .await;

        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Tue), "10:00 AM"))
            .await;
        assert!(outcome.success, "unexpected failure: {}", outcome.message);
        assert_eq!(outcome.message, "Evento creado correctamente");
        assert_eq!(
            outcome.meeting_link.as_deref(),
            Some("https://meet.google.com/abc-defg-hij")
        );
        assert_eq!(outcome.calendar_synced, Some(true));
        // mount_create_event_success asserts exactly one write on drop.
    }

    #[tokio::test]
    async fn booking_without_link_reports_sync_pending() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_success(None, false).await;

        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Wed), "11:00 AM"))
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.meeting_link, None);
        assert_eq!(outcome.calendar_synced, Some(false));
    }

    #[tokio::test]
    async fn write_timeout_maps_to_timeout_kind_with_single_attempt() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_timeout().await;

        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Thu), "10:00 AM"))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(BookingErrorKind::Timeout));
        assert_eq!(outcome.error_kind.unwrap().to_string(), "timeout");
        // mount_create_event_timeout asserts exactly one write on drop.
    }

    #[tokio::test]
    async fn write_http_error_maps_to_status_kind() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_error(500).await;

        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Fri), "10:00 AM"))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(BookingErrorKind::Http(500)));
        assert_eq!(outcome.error_kind.unwrap().to_string(), "http_500");
        assert!(outcome.message.contains("500"));
    }

    #[tokio::test]
    async fn application_rejection_maps_to_api_error() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_rejection("Horario ya reservado").await;

        let outcome = coordinator_for(&api)
            .create(&request(next_date(Weekday::Mon), "10:00 AM"))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error_kind, Some(BookingErrorKind::ApiError));
        assert_eq!(outcome.message, "Horario ya reservado");
    }

    #[test]
    fn event_window_adds_the_duration() {
        let (start, end) = event_window("2026-03-02", "02:30 PM", 90).unwrap();
        assert_eq!(start, "2026-03-02 14:30:00");
        assert_eq!(end, "2026-03-02 16:00:00");
    }

    #[test]
    fn error_kinds_render_their_reason_codes() {
        assert_eq!(BookingErrorKind::ConnectionError.to_string(), "connection_error");
        assert_eq!(BookingErrorKind::InvalidDatetime.to_string(), "invalid_datetime");
        assert_eq!(BookingErrorKind::UnknownError.to_string(), "unknown_error");
        assert_eq!(BookingErrorKind::Http(404).to_string(), "http_404");
    }
}
