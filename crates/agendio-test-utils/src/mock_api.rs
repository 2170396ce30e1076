// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiremock harness simulating the upstream business APIs.

use std::time::Duration;

use agendio_upstream::{ApiClient, ApiSettings};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock of the business endpoints with helpers for the common fixtures.
///
/// Each `mount_*` method registers one wiremock responder; pass
/// `expect(n)` assertions through the returned [`MockServer`] guards where
/// a test needs exact call counts.
pub struct MockBusinessApi {
    server: MockServer,
}

impl MockBusinessApi {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// The underlying wiremock server, for custom mounts.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Client settings pointing every endpoint at this mock, with short
    /// timeouts so timeout tests stay fast.
    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            info_url: format!("{}/informacion", self.server.uri()),
            booking_url: format!("{}/agendar", self.server.uri()),
            calendar_url: format!("{}/calendario", self.server.uri()),
            faq_url: format!("{}/preguntas", self.server.uri()),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_millis(500),
            booking_timeout: Duration::from_millis(500),
        }
    }

    /// A ready [`ApiClient`] wired to this mock.
    pub fn client(&self) -> ApiClient {
        ApiClient::new(self.settings()).expect("mock client settings are valid")
    }

    /// Serves a weekly schedule where every day uses the same range string
    /// (e.g. `"09:00-18:00"` or `"CERRADO"`).
    pub async fn mount_uniform_schedule(&self, range: &str) {
        self.mount_schedule_days(&[range; 7]).await;
    }

    /// Serves a weekly schedule from seven per-day range strings, Monday
    /// first. An empty string maps to a null day.
    pub async fn mount_schedule_days(&self, days: &[&str; 7]) {
        self.mount_schedule_body(schedule_body(days, None)).await;
    }

    /// Serves a weekly schedule with a blocked-hours descriptor attached.
    pub async fn mount_schedule_with_blackouts(
        &self,
        days: &[&str; 7],
        blackouts: serde_json::Value,
    ) {
        self.mount_schedule_body(schedule_body(days, Some(blackouts)))
            .await;
    }

    /// Serves an arbitrary `horario_reuniones` body.
    pub async fn mount_schedule_body(&self, horario: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(json!({"codOpe": "OBTENER_HORARIO_REUNIONES"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "horario_reuniones": horario
            })))
            .mount(&self.server)
            .await;
    }

    /// Makes the schedule lookup fail with the given HTTP status.
    pub async fn mount_schedule_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(json!({"codOpe": "OBTENER_HORARIO_REUNIONES"})))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Answers availability checks with the given verdict.
    pub async fn mount_availability(&self, disponible: bool) {
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .and(body_partial_json(json!({"codOpe": "CONSULTAR_DISPONIBILIDAD"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "disponible": disponible
            })))
            .mount(&self.server)
            .await;
    }

    /// Makes availability checks fail with the given HTTP status.
    pub async fn mount_availability_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .and(body_partial_json(json!({"codOpe": "CONSULTAR_DISPONIBILIDAD"})))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serves slot suggestions, asserting the endpoint is called exactly
    /// `expected_calls` times.
    pub async fn mount_suggestions(
        &self,
        sugerencias: serde_json::Value,
        mensaje: &str,
        expected_calls: u64,
    ) {
        let total = sugerencias.as_array().map(|a| a.len()).unwrap_or(0);
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .and(body_partial_json(json!({"codOpe": "SUGERIR_HORARIOS"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "sugerencias": sugerencias,
                "mensaje": mensaje,
                "total": total
            })))
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Makes suggestion lookups fail with the given HTTP status.
    pub async fn mount_suggestions_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .and(body_partial_json(json!({"codOpe": "SUGERIR_HORARIOS"})))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serves a successful event creation, asserting exactly one write.
    pub async fn mount_create_event_success(
        &self,
        meet_link: Option<&str>,
        calendar_synced: bool,
    ) {
        let mut body = json!({
            "success": true,
            "message": "Evento creado correctamente",
            "google_calendar_synced": calendar_synced
        });
        if let Some(link) = meet_link {
            body["google_meet_link"] = json!(link);
        }
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .and(body_partial_json(json!({"codOpe": "CREAR_EVENTO"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Rejects the event creation at the application level, asserting
    /// exactly one write.
    pub async fn mount_create_event_rejection(&self, message: &str) {
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .and(body_partial_json(json!({"codOpe": "CREAR_EVENTO"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false,
                "message": message
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Times the event creation out (delay past the booking timeout),
    /// asserting exactly one write.
    pub async fn mount_create_event_timeout(&self) {
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .and(body_partial_json(json!({"codOpe": "CREAR_EVENTO"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(json!({"success": true})),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Makes the event creation fail with the given HTTP status, asserting
    /// exactly one write.
    pub async fn mount_create_event_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .and(body_partial_json(json!({"codOpe": "CREAR_EVENTO"})))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Serves the business-context text for prompt assembly.
    pub async fn mount_business_context(&self, contexto: &str) {
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(json!({"codOpe": "OBTENER_CONTEXTO_NEGOCIO"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "contexto_negocio": contexto
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves an FAQ list.
    pub async fn mount_faqs(&self, faqs: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/preguntas"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "preguntas_frecuentes": faqs
            })))
            .mount(&self.server)
            .await;
    }

    /// Serves empty product and service catalogs.
    pub async fn mount_empty_catalogs(&self) {
        for op in ["OBTENER_PRODUCTOS_CITAS", "OBTENER_SERVICIOS_CITAS"] {
            Mock::given(method("POST"))
                .and(path("/informacion"))
                .and(body_partial_json(json!({"codOpe": op})))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "success": true,
                    "items": []
                })))
                .mount(&self.server)
                .await;
        }
    }
}

/// Builds a `horario_reuniones` body from seven Monday-first day strings.
fn schedule_body(days: &[&str; 7], blackouts: Option<serde_json::Value>) -> serde_json::Value {
    let keys = [
        "reunion_lunes",
        "reunion_martes",
        "reunion_miercoles",
        "reunion_jueves",
        "reunion_viernes",
        "reunion_sabado",
        "reunion_domingo",
    ];
    let mut body = json!({});
    for (key, day) in keys.iter().zip(days) {
        body[*key] = if day.is_empty() {
            serde_json::Value::Null
        } else {
            json!(day)
        };
    }
    if let Some(blackouts) = blackouts {
        body["horarios_bloqueados"] = blackouts;
    }
    body
}
