// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client for the business APIs.
//!
//! One [`reqwest::Client`] backs every endpoint so the connection pool is
//! reused across calls. Errors are mapped into the [`UpstreamError`] kinds
//! the retry and fail-open layers match on.

use std::time::Duration;

use agendio_core::{AgendioError, TenantId, UpstreamError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{
    AvailabilityQuery, AvailabilityRequest, AvailabilityResponse, ContextResponse, CreateEventRequest,
    CreateEventResponse, FaqItem, FaqRequest, FaqResponse, InfoRequest, RawWeeklySchedule,
    ScheduleResponse, SuggestQuery, SuggestRequest, SuggestResponse, OP_CHECK_AVAILABILITY,
    OP_FETCH_CONTEXT, OP_FETCH_PRODUCTS, OP_FETCH_SCHEDULE, OP_FETCH_SERVICES, OP_SUGGEST_SLOTS,
};

/// Maximum product/service names surfaced from catalog lookups.
const MAX_CATALOG_NAMES: usize = 10;

/// Endpoint URLs and timeouts for the upstream business systems.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Information endpoint (schedules, business context, catalogs).
    pub info_url: String,
    /// Booking endpoint (availability checks, slot suggestions).
    pub booking_url: String,
    /// Calendar endpoint (event creation).
    pub calendar_url: String,
    /// FAQ endpoint.
    pub faq_url: String,
    pub connect_timeout: Duration,
    /// Deadline for read calls.
    pub request_timeout: Duration,
    /// Deadline for the calendar write (longer than reads; never retried).
    pub booking_timeout: Duration,
}

impl ApiSettings {
    /// Settings from the `[upstream]` config section.
    pub fn from_config(config: &agendio_config::model::UpstreamConfig) -> Self {
        Self {
            info_url: config.info_url.clone(),
            booking_url: config.booking_url.clone(),
            calendar_url: config.calendar_url.clone(),
            faq_url: config.faq_url.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            booking_timeout: Duration::from_secs(config.booking_timeout_secs),
        }
    }
}

/// HTTP client for the business APIs.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ApiSettings,
}

impl ApiClient {
    /// Builds the shared client with pooled connections and JSON headers.
    pub fn new(settings: ApiSettings) -> Result<Self, AgendioError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| AgendioError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, settings })
    }

    /// Fetches a tenant's raw weekly schedule (`OBTENER_HORARIO_REUNIONES`).
    pub async fn fetch_weekly_schedule(
        &self,
        tenant_id: TenantId,
    ) -> Result<RawWeeklySchedule, UpstreamError> {
        let body = InfoRequest {
            op: OP_FETCH_SCHEDULE,
            id_empresa: tenant_id.0,
        };
        debug!(tenant_id = %tenant_id, "fetching weekly schedule");
        let resp: ScheduleResponse = self.post_json(&self.settings.info_url, &body).await?;
        if !resp.success {
            return Err(UpstreamError::Api(
                resp.error.unwrap_or_else(|| "respuesta sin horario".to_string()),
            ));
        }
        resp.horario_reuniones
            .ok_or_else(|| UpstreamError::Api("respuesta sin horario".to_string()))
    }

    /// Checks whether a specific window is free (`CONSULTAR_DISPONIBILIDAD`).
    pub async fn check_window(&self, query: &AvailabilityQuery) -> Result<bool, UpstreamError> {
        let body = AvailabilityRequest {
            op: OP_CHECK_AVAILABILITY,
            id_empresa: query.tenant_id,
            fecha_inicio: &query.fecha_inicio,
            fecha_fin: &query.fecha_fin,
            slots: query.slots,
            agendar_usuario: query.book_for_assignee as u8,
            agendar_sucursal: query.book_for_branch as u8,
        };
        debug!(
            tenant_id = query.tenant_id,
            window_start = %query.fecha_inicio,
            "checking window availability"
        );
        let resp: AvailabilityResponse = self.post_json(&self.settings.booking_url, &body).await?;
        if !resp.success {
            return Err(UpstreamError::Api(
                resp.error.unwrap_or_else(|| "consulta sin éxito".to_string()),
            ));
        }
        Ok(resp.disponible)
    }

    /// Fetches slot suggestions for today and tomorrow (`SUGERIR_HORARIOS`).
    pub async fn suggest_slots(&self, query: &SuggestQuery) -> Result<SuggestResponse, UpstreamError> {
        let body = SuggestRequest {
            op: OP_SUGGEST_SLOTS,
            id_empresa: query.tenant_id,
            duracion_minutos: query.duration_minutes,
            slots: query.slots,
            agendar_usuario: query.book_for_assignee as u8,
            agendar_sucursal: query.book_for_branch as u8,
        };
        debug!(tenant_id = query.tenant_id, "fetching slot suggestions");
        let resp: SuggestResponse = self.post_json(&self.settings.booking_url, &body).await?;
        if !resp.success {
            return Err(UpstreamError::Api("sugerencias sin éxito".to_string()));
        }
        Ok(resp)
    }

    /// Creates a calendar event (`CREAR_EVENTO`).
    ///
    /// Issued exactly once with the dedicated booking timeout. An
    /// application-level rejection arrives as `Ok` with `success == false`;
    /// the coordinator maps both shapes into its typed outcome. Callers
    /// MUST NOT retry: a timed-out write may still have created the event.
    pub async fn create_event(
        &self,
        request: &CreateEventRequest,
    ) -> Result<CreateEventResponse, UpstreamError> {
        debug!(
            id_prospecto = request.id_prospecto,
            fecha_inicio = %request.fecha_inicio,
            "creating calendar event"
        );
        let response = self
            .http
            .post(&self.settings.calendar_url)
            .timeout(self.settings.booking_timeout)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "calendar endpoint returned error status");
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response
            .json::<CreateEventResponse>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    /// Fetches the tenant's business-context text (`OBTENER_CONTEXTO_NEGOCIO`).
    pub async fn fetch_business_context(
        &self,
        tenant_id: TenantId,
    ) -> Result<String, UpstreamError> {
        let body = InfoRequest {
            op: OP_FETCH_CONTEXT,
            id_empresa: tenant_id.0,
        };
        let resp: ContextResponse = self.post_json(&self.settings.info_url, &body).await?;
        if !resp.success {
            return Err(UpstreamError::Api(
                resp.error.unwrap_or_else(|| "contexto sin éxito".to_string()),
            ));
        }
        Ok(resp.contexto_negocio.unwrap_or_default().trim().to_string())
    }

    /// Fetches the FAQ set for a chatbot.
    pub async fn fetch_faqs(&self, chatbot_id: i64) -> Result<Vec<FaqItem>, UpstreamError> {
        let body = FaqRequest {
            id_chatbot: chatbot_id,
        };
        let resp: FaqResponse = self.post_json(&self.settings.faq_url, &body).await?;
        if !resp.success {
            return Err(UpstreamError::Api(
                resp.error.unwrap_or_else(|| "FAQs sin éxito".to_string()),
            ));
        }
        Ok(resp.preguntas_frecuentes)
    }

    /// Fetches product and service names concurrently, capped at ten each.
    ///
    /// Either lookup failing degrades to an empty list rather than failing
    /// the pair; these feed prompt assembly and are never load-bearing.
    pub async fn fetch_catalog_names(
        &self,
        tenant_id: TenantId,
    ) -> (Vec<String>, Vec<String>) {
        let (products, services) = futures::join!(
            self.fetch_names(tenant_id, OP_FETCH_PRODUCTS, "productos"),
            self.fetch_names(tenant_id, OP_FETCH_SERVICES, "servicios"),
        );
        let products = products.unwrap_or_else(|e| {
            warn!(tenant_id = %tenant_id, error = %e, "product name lookup failed");
            Vec::new()
        });
        let services = services.unwrap_or_else(|e| {
            warn!(tenant_id = %tenant_id, error = %e, "service name lookup failed");
            Vec::new()
        });
        debug!(
            tenant_id = %tenant_id,
            products = products.len(),
            services = services.len(),
            "catalog names fetched"
        );
        (products, services)
    }

    /// One catalog lookup; items may be objects with a `nombre` field or
    /// plain strings, under `response_key` or a generic `items` key.
    async fn fetch_names(
        &self,
        tenant_id: TenantId,
        op: &'static str,
        response_key: &str,
    ) -> Result<Vec<String>, UpstreamError> {
        let body = InfoRequest {
            op,
            id_empresa: tenant_id.0,
        };
        let resp: serde_json::Value = self.post_json(&self.settings.info_url, &body).await?;
        if !resp["success"].as_bool().unwrap_or(false) {
            return Err(UpstreamError::Api(format!("{op} sin éxito")));
        }
        let items = resp[response_key]
            .as_array()
            .or_else(|| resp["items"].as_array())
            .cloned()
            .unwrap_or_default();
        let names = items
            .iter()
            .take(MAX_CATALOG_NAMES)
            .filter_map(|item| {
                item["nombre"]
                    .as_str()
                    .or_else(|| item.as_str())
                    .map(|s| s.trim().to_string())
            })
            .filter(|s| !s.is_empty())
            .collect();
        Ok(names)
    }

    /// POSTs a JSON body and decodes the JSON response, mapping transport,
    /// status, and decode failures into their [`UpstreamError`] kinds.
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R, UpstreamError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        response
            .json::<R>()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

/// Maps a reqwest send failure into a transport-level error kind.
fn map_transport_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Timeout
    } else {
        UpstreamError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> ApiSettings {
        ApiSettings {
            info_url: format!("{}/informacion", server.uri()),
            booking_url: format!("{}/agendar", server.uri()),
            calendar_url: format!("{}/calendario", server.uri()),
            faq_url: format!("{}/preguntas", server.uri()),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_millis(500),
            booking_timeout: Duration::from_millis(500),
        }
    }

    fn client(server: &MockServer) -> ApiClient {
        ApiClient::new(settings(server)).unwrap()
    }

    #[test]
    fn api_settings_map_from_config_section() {
        let config = agendio_config::model::UpstreamConfig::default();
        let settings = ApiSettings::from_config(&config);
        assert_eq!(settings.info_url, config.info_url);
        assert_eq!(settings.connect_timeout, Duration::from_secs(5));
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.booking_timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn fetch_schedule_sends_op_code_and_parses_days() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(serde_json::json!({
                "codOpe": "OBTENER_HORARIO_REUNIONES",
                "id_empresa": 7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "horario_reuniones": {
                    "reunion_lunes": "09:00-18:00",
                    "reunion_domingo": "CERRADO"
                }
            })))
            .mount(&server)
            .await;

        let raw = client(&server).fetch_weekly_schedule(TenantId(7)).await.unwrap();
        assert_eq!(raw.reunion_lunes.as_deref(), Some("09:00-18:00"));
        assert_eq!(raw.reunion_domingo.as_deref(), Some("CERRADO"));
    }

    #[tokio::test]
    async fn schedule_without_success_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error": "empresa no encontrada"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_weekly_schedule(TenantId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Api(msg) if msg.contains("empresa")));
    }

    #[tokio::test]
    async fn http_error_status_maps_to_status_kind() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_weekly_schedule(TenantId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Status(502)));
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(5))
                    .set_body_json(serde_json::json!({"success": true})),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch_weekly_schedule(TenantId(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Timeout));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>mantenimiento</html>"))
            .mount(&server)
            .await;

        let query = AvailabilityQuery {
            tenant_id: 1,
            fecha_inicio: "2026-03-02 14:00:00".into(),
            fecha_fin: "2026-03-02 15:00:00".into(),
            slots: 60,
            book_for_assignee: true,
            book_for_branch: false,
        };
        let err = client(&server).check_window(&query).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[tokio::test]
    async fn check_window_reports_occupied_slot() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/agendar"))
            .and(body_partial_json(serde_json::json!({
                "codOpe": "CONSULTAR_DISPONIBILIDAD",
                "agendar_usuario": 1,
                "agendar_sucursal": 0
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "disponible": false
            })))
            .mount(&server)
            .await;

        let query = AvailabilityQuery {
            tenant_id: 3,
            fecha_inicio: "2026-03-02 14:00:00".into(),
            fecha_fin: "2026-03-02 15:00:00".into(),
            slots: 60,
            book_for_assignee: true,
            book_for_branch: false,
        };
        assert!(!client(&server).check_window(&query).await.unwrap());
    }

    #[tokio::test]
    async fn create_event_posts_exactly_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .and(body_partial_json(serde_json::json!({
                "codOpe": "CREAR_EVENTO",
                "correo_cliente": "ana@ejemplo.com"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "message": "Evento creado correctamente",
                "google_meet_link": "https://meet.google.com/abc-defg-hij",
                "google_calendar_synced": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateEventRequest::new(
            1,
            42,
            "Reunion para el usuario: Ana Pérez".into(),
            "2026-03-02 14:00:00".into(),
            "2026-03-02 15:00:00".into(),
            "ana@ejemplo.com".into(),
            "vendedor@ejemplo.com".into(),
            true,
        );
        let resp = client(&server).create_event(&request).await.unwrap();
        assert!(resp.success);
        assert_eq!(
            resp.google_meet_link.as_deref(),
            Some("https://meet.google.com/abc-defg-hij")
        );
        assert_eq!(resp.google_calendar_synced, Some(true));
    }

    #[tokio::test]
    async fn create_event_rejection_comes_back_as_unsuccessful_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendario"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "Horario ya reservado"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = CreateEventRequest::new(
            1,
            42,
            "Reunion".into(),
            "2026-03-02 14:00:00".into(),
            "2026-03-02 15:00:00".into(),
            "a@b.com".into(),
            String::new(),
            true,
        );
        let resp = client(&server).create_event(&request).await.unwrap();
        assert!(!resp.success);
        assert_eq!(resp.message.as_deref(), Some("Horario ya reservado"));
    }

    #[tokio::test]
    async fn catalog_names_cap_at_ten_and_accept_plain_strings() {
        let server = MockServer::start().await;
        let productos: Vec<_> = (0..15)
            .map(|i| serde_json::json!({"nombre": format!("Producto {i}")}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(serde_json::json!({"codOpe": "OBTENER_PRODUCTOS_CITAS"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "productos": productos
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .and(body_partial_json(serde_json::json!({"codOpe": "OBTENER_SERVICIOS_CITAS"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "items": ["Consulta", "Demostración"]
            })))
            .mount(&server)
            .await;

        let (products, services) = client(&server).fetch_catalog_names(TenantId(1)).await;
        assert_eq!(products.len(), 10);
        assert_eq!(services, vec!["Consulta", "Demostración"]);
    }

    #[tokio::test]
    async fn catalog_failure_degrades_to_empty_lists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/informacion"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (products, services) = client(&server).fetch_catalog_names(TenantId(1)).await;
        assert!(products.is_empty());
        assert!(services.is_empty());
    }

    #[tokio::test]
    async fn faqs_parse_question_answer_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/preguntas"))
            .and(body_partial_json(serde_json::json!({"id_chatbot": 9})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "preguntas_frecuentes": [
                    {"pregunta": "¿Atienden sábados?", "respuesta": "Sí, hasta mediodía."}
                ]
            })))
            .mount(&server)
            .await;

        let faqs = client(&server).fetch_faqs(9).await.unwrap();
        assert_eq!(faqs.len(), 1);
        assert_eq!(faqs[0].pregunta, "¿Atienden sábados?");
    }
}
