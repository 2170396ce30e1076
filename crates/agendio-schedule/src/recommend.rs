// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-facing slot recommendations.
//!
//! Three paths, matching what the upstream can actually answer:
//! - a concrete date *and* time is checked against the live calendar and
//!   confirmed or rejected directly;
//! - a date beyond today/tomorrow gets no fabricated suggestions (the
//!   upstream suggestion source only covers those two days) -- the user is
//!   asked to propose a time instead;
//! - otherwise the upstream suggestion list is fetched (single-flighted
//!   per tenant) and formatted with localized day names, marking occupied
//!   slots.

use agendio_upstream::{SlotSuggestion, SuggestQuery};
use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use tracing::warn;

use crate::model::day_name_title;
use crate::validator::ScheduleValidator;

/// A recommendation reply: always text, plus the raw suggestion list when
/// the upstream produced one.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub text: String,
    pub suggestions: Option<Vec<SlotSuggestion>>,
    pub total: u32,
    pub headline: Option<String>,
}

impl Recommendation {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggestions: None,
            total: 0,
            headline: None,
        }
    }
}

/// Stock fallback when the suggestion source cannot be reached.
const FALLBACK_TEXT: &str =
    "No pude obtener sugerencias ahora. Indica una fecha y hora que prefieras y la verifico.";

impl ScheduleValidator {
    /// Produces slot recommendations for this tenant.
    pub async fn recommend(
        &self,
        requested_date: Option<&str>,
        requested_time: Option<&str>,
    ) -> Recommendation {
        let requested_time = requested_time.map(str::trim).filter(|t| !t.is_empty());

        // Concrete date and time: check that exact slot first.
        if let (Some(date), Some(time)) = (requested_date, requested_time) {
            let availability = self.check_availability(date, time).await;
            if availability.available {
                return Recommendation::text_only(format!(
                    "El {date} a las {time} está disponible. ¿Confirmamos la cita?"
                ));
            }
            let reason = availability
                .reason
                .unwrap_or_else(|| "Ese horario no está disponible.".to_string());
            return Recommendation::text_only(format!(
                "{reason} ¿Te gustaría que te sugiera otros horarios?"
            ));
        }

        // The suggestion source only covers today and tomorrow; for any
        // other date, ask for a time instead of fabricating slots.
        if let Some(date) = requested_date
            && let Ok(parsed) = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        {
            let today = self.service().now_local().date();
            let tomorrow = today + TimeDelta::days(1);
            if parsed != today && parsed != tomorrow {
                return Recommendation::text_only(
                    "Para esa fecha indica una hora que prefieras y la verifico.",
                );
            }
        }

        let options = self.options();
        let query = SuggestQuery {
            tenant_id: self.tenant_id().0,
            duration_minutes: options.duration_minutes,
            slots: options.slots,
            book_for_assignee: options.book_for_assignee,
            book_for_branch: options.book_for_branch,
        };

        match self.service().suggestions(self.tenant_id(), &query).await {
            Ok(response) if !response.sugerencias.is_empty() && response.total > 0 => {
                let lines = format_suggestion_lines(&response.sugerencias);
                if lines.is_empty() {
                    return Recommendation::text_only(FALLBACK_TEXT);
                }
                let headline = response
                    .mensaje
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Horarios sugeridos:".to_string());
                Recommendation {
                    text: format!("{headline}\n\n{}", lines.join("\n")),
                    suggestions: Some(response.sugerencias),
                    total: response.total,
                    headline: response.mensaje,
                }
            }
            Ok(_) => Recommendation::text_only(FALLBACK_TEXT),
            Err(e) => {
                warn!(
                    tenant_id = %self.tenant_id(),
                    error = %e,
                    "suggestion lookup failed, using fallback"
                );
                Recommendation::text_only(FALLBACK_TEXT)
            }
        }
    }
}

/// Numbered suggestion lines; entries missing a day or time keep their
/// position but are skipped.
fn format_suggestion_lines(suggestions: &[SlotSuggestion]) -> Vec<String> {
    let mut lines = Vec::with_capacity(suggestions.len());
    for (index, suggestion) in suggestions.iter().enumerate() {
        if suggestion.dia.is_empty() || suggestion.hora_legible.is_empty() {
            continue;
        }
        let mut text = match suggestion.dia.as_str() {
            "hoy" => format!("Hoy a las {}", suggestion.hora_legible),
            "mañana" => format!("Mañana a las {}", suggestion.hora_legible),
            other => match NaiveDateTime::parse_from_str(
                &suggestion.fecha_inicio,
                "%Y-%m-%d %H:%M:%S",
            ) {
                Ok(start) => format!(
                    "{} {} a las {}",
                    day_name_title(start.weekday()),
                    start.format("%d/%m"),
                    suggestion.hora_legible
                ),
                Err(_) => format!("{} a las {}", other, suggestion.hora_legible),
            },
        };
        if !suggestion.disponible {
            text.push_str(" (ocupado)");
        }
        lines.push(format!("{}. {}", index + 1, text));
    }
    lines
}
