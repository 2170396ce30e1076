// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the business APIs.
//!
//! Field names mirror the upstream JSON contract exactly (Spanish,
//! `codOpe`-tagged), so these structs serialize byte-compatible payloads.
//! Response structs default every optional field: the upstream returns
//! sparse bodies and absent keys must never fail deserialization.

use serde::{Deserialize, Serialize};

// Operation codes accepted by the upstream endpoints.
pub(crate) const OP_FETCH_SCHEDULE: &str = "OBTENER_HORARIO_REUNIONES";
pub(crate) const OP_FETCH_CONTEXT: &str = "OBTENER_CONTEXTO_NEGOCIO";
pub(crate) const OP_FETCH_PRODUCTS: &str = "OBTENER_PRODUCTOS_CITAS";
pub(crate) const OP_FETCH_SERVICES: &str = "OBTENER_SERVICIOS_CITAS";
pub(crate) const OP_CHECK_AVAILABILITY: &str = "CONSULTAR_DISPONIBILIDAD";
pub(crate) const OP_SUGGEST_SLOTS: &str = "SUGERIR_HORARIOS";
pub(crate) const OP_CREATE_EVENT: &str = "CREAR_EVENTO";

fn default_true() -> bool {
    true
}

/// Generic request body for information-endpoint lookups keyed by tenant.
#[derive(Debug, Serialize)]
pub(crate) struct InfoRequest {
    #[serde(rename = "codOpe")]
    pub op: &'static str,
    pub id_empresa: i64,
}

/// Raw weekly schedule exactly as the information endpoint returns it:
/// one free-form string per day (`"10:00-19:00"`, `"CERRADO"`, or null)
/// plus an opaque blocked-hours descriptor.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawWeeklySchedule {
    #[serde(default)]
    pub reunion_lunes: Option<String>,
    #[serde(default)]
    pub reunion_martes: Option<String>,
    #[serde(default)]
    pub reunion_miercoles: Option<String>,
    #[serde(default)]
    pub reunion_jueves: Option<String>,
    #[serde(default)]
    pub reunion_viernes: Option<String>,
    #[serde(default)]
    pub reunion_sabado: Option<String>,
    #[serde(default)]
    pub reunion_domingo: Option<String>,
    /// JSON array or comma-separated string; parsed defensively downstream.
    #[serde(default)]
    pub horarios_bloqueados: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub horario_reuniones: Option<RawWeeklySchedule>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContextResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub contexto_negocio: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Query for a specific `[start, end)` window against the live calendar.
#[derive(Debug, Clone)]
pub struct AvailabilityQuery {
    pub tenant_id: i64,
    /// `YYYY-MM-DD HH:MM:SS` local datetime.
    pub fecha_inicio: String,
    /// `YYYY-MM-DD HH:MM:SS` local datetime.
    pub fecha_fin: String,
    pub slots: u32,
    pub book_for_assignee: bool,
    pub book_for_branch: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct AvailabilityRequest<'a> {
    #[serde(rename = "codOpe")]
    pub op: &'static str,
    pub id_empresa: i64,
    pub fecha_inicio: &'a str,
    pub fecha_fin: &'a str,
    pub slots: u32,
    pub agendar_usuario: u8,
    pub agendar_sucursal: u8,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AvailabilityResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub disponible: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Query for slot suggestions covering today and tomorrow.
#[derive(Debug, Clone)]
pub struct SuggestQuery {
    pub tenant_id: i64,
    pub duration_minutes: u32,
    pub slots: u32,
    pub book_for_assignee: bool,
    pub book_for_branch: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct SuggestRequest {
    #[serde(rename = "codOpe")]
    pub op: &'static str,
    pub id_empresa: i64,
    pub duracion_minutos: u32,
    pub slots: u32,
    pub agendar_usuario: u8,
    pub agendar_sucursal: u8,
}

/// One suggested slot from the booking endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlotSuggestion {
    /// `"hoy"`, `"mañana"`, or a day label.
    #[serde(default)]
    pub dia: String,
    /// Human-readable time, e.g. `"09:00 AM"`.
    #[serde(default)]
    pub hora_legible: String,
    /// False when the slot is already taken (shown as occupied).
    #[serde(default = "default_true")]
    pub disponible: bool,
    /// `YYYY-MM-DD HH:MM:SS` start, used to localize the day name.
    #[serde(default)]
    pub fecha_inicio: String,
}

/// Suggestion list plus the upstream's own headline message.
#[derive(Debug, Clone, Deserialize)]
pub struct SuggestResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub sugerencias: Vec<SlotSuggestion>,
    #[serde(default)]
    pub mensaje: Option<String>,
    #[serde(default)]
    pub total: u32,
}

/// Payload for the one non-retried calendar write.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEventRequest {
    #[serde(rename = "codOpe")]
    pub op: &'static str,
    pub id_usuario: i64,
    pub id_prospecto: i64,
    pub titulo: String,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub fecha_inicio: String,
    /// `YYYY-MM-DD HH:MM:SS`.
    pub fecha_fin: String,
    pub correo_cliente: String,
    pub correo_usuario: String,
    pub agendar_usuario: u8,
}

impl CreateEventRequest {
    /// Stamps the operation code; the caller fills the event fields.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id_usuario: i64,
        id_prospecto: i64,
        titulo: String,
        fecha_inicio: String,
        fecha_fin: String,
        correo_cliente: String,
        correo_usuario: String,
        book_for_assignee: bool,
    ) -> Self {
        Self {
            op: OP_CREATE_EVENT,
            id_usuario,
            id_prospecto,
            titulo,
            fecha_inicio,
            fecha_fin,
            correo_cliente,
            correo_usuario,
            agendar_usuario: book_for_assignee as u8,
        }
    }
}

/// Calendar-endpoint verdict on the write, including the optional meeting
/// link and whether the downstream calendar sync also succeeded.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub google_meet_link: Option<String>,
    #[serde(default)]
    pub google_calendar_synced: Option<bool>,
    #[serde(default)]
    pub google_calendar_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FaqRequest {
    pub id_chatbot: i64,
}

/// One frequently-asked question/answer pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FaqItem {
    #[serde(default)]
    pub pregunta: String,
    #[serde(default)]
    pub respuesta: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FaqResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub preguntas_frecuentes: Vec<FaqItem>,
    #[serde(default)]
    pub error: Option<String>,
}
