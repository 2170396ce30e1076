// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool entry points invoked by the conversational agent.
//!
//! Two tools, mirroring what the LLM can call: an availability check that
//! answers with suggestions or an exact-slot verdict, and a booking
//! creation that validates and writes the calendar event. Both return
//! plain user-facing Spanish text -- the agent relays it verbatim.

use std::sync::Arc;

use agendio_booking::{BookingCoordinator, BookingRequest, RejectionStage};
use agendio_core::{ProspectId, SessionId, TenantId};
use agendio_schedule::{ScheduleService, ScheduleValidator, ValidatorOptions};
use agendio_upstream::ApiClient;
use tracing::debug;

/// Fully-typed per-tenant/per-session configuration injected into every
/// tool call. Optional orchestrator fields take these defaults at
/// construction time.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    /// Defaults to the session id when the orchestrator sent none.
    pub prospect_id: ProspectId,
    /// Chatbot owning the FAQ set, when one exists.
    pub chatbot_id: Option<i64>,
    pub duration_minutes: u32,
    pub slots: u32,
    pub book_for_assignee: bool,
    pub book_for_branch: bool,
    /// Seller/assignee registering appointments.
    pub assignee_user_id: i64,
    pub assignee_email: String,
}

impl ToolContext {
    /// Context with the orchestrator's documented defaults: 60-minute
    /// appointments, 60 slots, assignee booking on, branch booking off.
    pub fn new(tenant_id: TenantId, session_id: SessionId) -> Self {
        Self {
            tenant_id,
            session_id,
            prospect_id: ProspectId(session_id.0),
            chatbot_id: None,
            duration_minutes: 60,
            slots: 60,
            book_for_assignee: true,
            book_for_branch: false,
            assignee_user_id: 1,
            assignee_email: String::new(),
        }
    }

    fn validator_options(&self) -> ValidatorOptions {
        ValidatorOptions {
            duration_minutes: self.duration_minutes,
            slots: self.slots,
            book_for_assignee: self.book_for_assignee,
            book_for_branch: self.book_for_branch,
        }
    }
}

/// The agent-facing booking tools.
#[derive(Debug, Clone)]
pub struct BookingTools {
    schedule: Arc<ScheduleService>,
    coordinator: BookingCoordinator,
}

impl BookingTools {
    pub fn new(client: Arc<ApiClient>, schedule: Arc<ScheduleService>) -> Self {
        let coordinator = BookingCoordinator::new(client, Arc::clone(&schedule));
        Self {
            schedule,
            coordinator,
        }
    }

    fn validator(&self, context: &ToolContext) -> ScheduleValidator {
        ScheduleValidator::new(
            Arc::clone(&self.schedule),
            context.tenant_id,
            context.validator_options(),
        )
    }

    /// Availability lookup for a date (and optionally an exact time).
    ///
    /// With a concrete time the exact slot is checked; without one the
    /// upstream suggestions for today/tomorrow are formatted. `service`
    /// only flavors the fallback text.
    pub async fn check_availability(
        &self,
        context: &ToolContext,
        service: &str,
        date: &str,
        time: Option<&str>,
    ) -> String {
        debug!(
            tenant_id = %context.tenant_id,
            service,
            date,
            time = time.unwrap_or("no indicada"),
            "tool: check_availability"
        );
        let recommendation = self.validator(context).recommend(Some(date), time).await;
        if recommendation.text.is_empty() {
            return format!(
                "Horarios disponibles para {service} el {date}. Consulta directamente para más detalles."
            );
        }
        recommendation.text
    }

    /// Creates an appointment after full validation, relaying the
    /// confirmation (with meeting link when present) or the rejection.
    pub async fn create_booking(
        &self,
        context: &ToolContext,
        service: &str,
        date: &str,
        time: &str,
        customer_name: &str,
        customer_contact: &str,
    ) -> String {
        debug!(
            tenant_id = %context.tenant_id,
            session_id = %context.session_id,
            service,
            date,
            time,
            "tool: create_booking"
        );
        let request = BookingRequest {
            tenant_id: context.tenant_id,
            session_id: context.session_id,
            prospect_id: context.prospect_id,
            service_name: service.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            duration_minutes: context.duration_minutes,
            customer_name: customer_name.to_string(),
            customer_email: customer_contact.to_string(),
            assignee_user_id: context.assignee_user_id,
            assignee_email: context.assignee_email.clone(),
            book_for_assignee: context.book_for_assignee,
            book_for_branch: context.book_for_branch,
            slots: context.slots,
        };

        let outcome = self.coordinator.create(&request).await;
        if outcome.success {
            let mut lines = vec![
                outcome.message.clone(),
                String::new(),
                "**Detalles:**".to_string(),
                format!("• Servicio: {service}"),
                format!("• Fecha: {date}"),
                format!("• Hora: {time}"),
                format!("• Nombre: {customer_name}"),
                String::new(),
            ];
            if let Some(link) = &outcome.meeting_link {
                lines.push(format!("La reunión será por videollamada. Enlace: {link}"));
            } else if outcome.calendar_synced == Some(false) {
                lines.push(
                    "Tu cita ya está reservada. No se pudo generar el enlace de videollamada; te contactaremos con los detalles."
                        .to_string(),
                );
            }
            lines.push(String::new());
            lines.push("¡Te esperamos!".to_string());
            return lines.join("\n");
        }

        match outcome.rejection {
            Some(RejectionStage::Input) => format!(
                "Datos inválidos: {}\n\nPor favor verifica la información.",
                outcome.message
            ),
            Some(RejectionStage::Slot) => {
                format!("{}\n\nPor favor elige otra fecha u hora.", outcome.message)
            }
            None => format!("{}\n\nPor favor intenta nuevamente.", outcome.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agendio_schedule::ScheduleSettings;
    use agendio_test_utils::MockBusinessApi;
    use chrono::{Datelike, TimeDelta, Utc, Weekday};
    use serde_json::json;

    fn tools_for(api: &MockBusinessApi) -> BookingTools {
        let client = Arc::new(api.client());
        let schedule = Arc::new(ScheduleService::new(
            Arc::clone(&client),
            ScheduleSettings::default(),
        ));
        BookingTools::new(client, schedule)
    }

    fn context() -> ToolContext {
        let mut ctx = ToolContext::new(TenantId(7), SessionId(1001));
        ctx.assignee_email = "vendedor@ejemplo.com".into();
        ctx
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

    #[test]
    fn context_defaults_follow_the_orchestrator() {
        let ctx = ToolContext::new(TenantId(7), SessionId(42));
        assert_eq!(ctx.prospect_id, ProspectId(42));
        assert_eq!(ctx.duration_minutes, 60);
        assert_eq!(ctx.slots, 60);
        assert!(ctx.book_for_assignee);
        assert!(!ctx.book_for_branch);
        assert_eq!(ctx.assignee_user_id, 1);
        assert!(ctx.chatbot_id.is_none());
    }

    #[tokio::test]
    async fn check_availability_with_exact_time_confirms_free_slot() {
        let api = MockBusinessApi::start().await;
        api.mount_availability(true).await;
        let reply = tools_for(&api)
            .check_availability(&context(), "demostración", "2031-05-12", Some("2:00 PM"))
            .await;
        assert!(reply.contains("está disponible"));
        assert!(reply.contains("¿Confirmamos la cita?"));
    }

    #[tokio::test]
    async fn check_availability_without_time_formats_suggestions() {
        let api = MockBusinessApi::start().await;
        api.mount_suggestions(
            json!([{"dia": "hoy", "hora_legible": "09:00 AM"}]),
            "Horarios disponibles encontrados",
            1,
        )
        .await;
        let reply = tools_for(&api)
            .check_availability(&context(), "consulta", "", None)
            .await;
        assert!(reply.contains("1. Hoy a las 09:00 AM"));
    }

    #[tokio::test]
    async fn create_booking_happy_path_lists_details_and_link() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_success(Some("https://meet.google.com/abc-defg-hij"), true)
            .await;

        let reply = tools_for(&api)
            .create_booking(
                &context(),
                "demostración",
                &next_date(Weekday::Tue),
                "10:00 AM",
                "Ana Pérez",
                "ana@ejemplo.com",
            )
            .await;
        assert!(reply.starts_with("Evento creado correctamente"));
        assert!(reply.contains("**Detalles:**"));
        assert!(reply.contains("• Servicio: demostración"));
        assert!(reply.contains("• Nombre: Ana Pérez"));
        assert!(reply.contains("Enlace: https://meet.google.com/abc-defg-hij"));
        assert!(reply.ends_with("¡Te esperamos!"));
    }

    #[tokio::test]
    async fn create_booking_without_link_mentions_pending_contact() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_success(None, false).await;

        let reply = tools_for(&api)
            .create_booking(
                &context(),
                "consulta",
                &next_date(Weekday::Wed),
                "11:00 AM",
                "Ana Pérez",
                "ana@ejemplo.com",
            )
            .await;
        assert!(reply.contains("No se pudo generar el enlace de videollamada"));
    }

    #[tokio::test]
    async fn create_booking_invalid_input_asks_to_verify() {
        let api = MockBusinessApi::start().await;
        let reply = tools_for(&api)
            .create_booking(
                &context(),
                "consulta",
                &next_date(Weekday::Mon),
                "10:00 AM",
                "Ana Pérez",
                "no-es-email",
            )
            .await;
        assert!(reply.starts_with("Datos inválidos:"));
        assert!(reply.ends_with("Por favor verifica la información."));
    }

    #[tokio::test]
    async fn create_booking_slot_rejection_asks_for_another_time() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        let reply = tools_for(&api)
            .create_booking(
                &context(),
                "consulta",
                &next_date(Weekday::Mon),
                "08:00 PM",
                "Ana Pérez",
                "ana@ejemplo.com",
            )
            .await;
        assert!(reply.contains("después del horario"));
        assert!(reply.ends_with("Por favor elige otra fecha u hora."));
    }

    #[tokio::test]
    async fn create_booking_write_failure_asks_to_retry() {
        let api = MockBusinessApi::start().await;
        api.mount_uniform_schedule("09:00-18:00").await;
        api.mount_availability(true).await;
        api.mount_create_event_error(503).await;

        let reply = tools_for(&api)
            .create_booking(
                &context(),
                "consulta",
                &next_date(Weekday::Thu),
                "10:00 AM",
                "Ana Pérez",
                "ana@ejemplo.com",
            )
            .await;
        assert!(reply.contains("Error del servidor (503)"));
        assert!(reply.ends_with("Por favor intenta nuevamente."));
        // mount_create_event_error asserts exactly one write on drop.
    }
}
