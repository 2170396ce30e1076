// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-level validation of booking data supplied by the conversational
//! agent. Only email is accepted as contact for appointments (no phone
//! numbers). Every error message is user-facing Spanish, surfaced before
//! any network activity.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;

use agendio_schedule::parse_time;

/// Simplified RFC 5322 email pattern.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

/// Letters (with Spanish accents), spaces, hyphens, and apostrophes.
static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-ZáéíóúÁÉÍÓÚñÑ\s\-']+$").expect("valid name regex")
});

/// Booking fields after validation and normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInput {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// Uppercased time in one of the accepted formats.
    pub time: String,
    /// Title-cased customer name.
    pub customer_name: String,
    /// Lowercased customer email.
    pub customer_email: String,
}

/// Validates every booking field, returning the first failure in field
/// order (date, time, name, contact) as a user-facing message.
pub fn validate_booking_input(
    date: &str,
    time: &str,
    customer_name: &str,
    customer_contact: &str,
    timezone: Tz,
) -> Result<NormalizedInput, String> {
    let date = check_date(date, timezone)?;
    let time = check_time(time)?;
    let customer_name = check_name(customer_name)?;
    let customer_email = check_email(customer_contact)?;
    Ok(NormalizedInput {
        date,
        time,
        customer_name,
        customer_email,
    })
}

fn check_date(value: &str, timezone: Tz) -> Result<String, String> {
    let trimmed = value.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        "Formato de fecha inválido. Debe ser YYYY-MM-DD (ejemplo: 2026-01-27)".to_string()
    })?;
    let today = Utc::now().with_timezone(&timezone).date_naive();
    if parsed < today {
        return Err("La fecha no puede ser en el pasado".to_string());
    }
    Ok(trimmed.to_string())
}

fn check_time(value: &str) -> Result<String, String> {
    let normalized = value.trim().to_uppercase();
    if parse_time(&normalized).is_none() {
        return Err(
            "Formato de hora inválido. Debe ser HH:MM AM/PM (ejemplo: 02:30 PM) o HH:MM (ejemplo: 14:30)"
                .to_string(),
        );
    }
    Ok(normalized)
}

fn check_name(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.chars().count() < 2 {
        return Err("El nombre debe tener al menos 2 caracteres".to_string());
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        return Err("El nombre no debe contener números".to_string());
    }
    if !NAME_PATTERN.is_match(trimmed) {
        return Err("El nombre contiene caracteres no válidos".to_string());
    }
    Ok(title_case(trimmed))
}

fn check_email(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("El email no puede estar vacío.".to_string());
    }
    if trimmed.len() > 254 {
        return Err("El email es demasiado largo.".to_string());
    }
    if !EMAIL_PATTERN.is_match(trimmed) {
        return Err(format!(
            "El contacto debe ser un email válido (ejemplo: nombre@dominio.com). Recibido: {trimmed}"
        ));
    }
    Ok(trimmed.to_lowercase())
}

/// Uppercases the first letter of each whitespace-separated word.
fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMA: Tz = chrono_tz::America::Lima;

    fn future_date() -> String {
        (Utc::now().with_timezone(&LIMA).date_naive() + chrono::TimeDelta::days(7))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[test]
    fn accepts_and_normalizes_valid_input() {
        let input = validate_booking_input(
            &future_date(),
            "2:30 pm",
            "ana maría lópez",
            "Ana.Lopez@Ejemplo.COM",
            LIMA,
        )
        .unwrap();
        assert_eq!(input.time, "2:30 PM");
        assert_eq!(input.customer_name, "Ana María López");
        assert_eq!(input.customer_email, "ana.lopez@ejemplo.com");
    }

    #[test]
    fn rejects_malformed_date() {
        let err =
            validate_booking_input("27-01-2026", "10:00 AM", "Ana", "a@b.com", LIMA).unwrap_err();
        assert!(err.contains("YYYY-MM-DD"));
    }

    #[test]
    fn rejects_past_date() {
        let err =
            validate_booking_input("2020-01-01", "10:00 AM", "Ana", "a@b.com", LIMA).unwrap_err();
        assert!(err.contains("pasado"));
    }

    #[test]
    fn rejects_malformed_time() {
        let err =
            validate_booking_input(&future_date(), "a las tres", "Ana", "a@b.com", LIMA)
                .unwrap_err();
        assert!(err.contains("Formato de hora inválido"));
    }

    #[test]
    fn rejects_name_with_digits() {
        let err =
            validate_booking_input(&future_date(), "10:00 AM", "Ana 2", "a@b.com", LIMA)
                .unwrap_err();
        assert!(err.contains("no debe contener números"));
    }

    #[test]
    fn rejects_single_character_name() {
        let err = validate_booking_input(&future_date(), "10:00 AM", "A", "a@b.com", LIMA)
            .unwrap_err();
        assert!(err.contains("al menos 2 caracteres"));
    }

    #[test]
    fn rejects_name_with_symbols() {
        let err =
            validate_booking_input(&future_date(), "10:00 AM", "Ana@Lopez", "a@b.com", LIMA)
                .unwrap_err();
        assert!(err.contains("caracteres no válidos"));
    }

    #[test]
    fn rejects_invalid_email() {
        let err = validate_booking_input(&future_date(), "10:00 AM", "Ana", "no-es-email", LIMA)
            .unwrap_err();
        assert!(err.contains("email válido"));
        assert!(err.contains("no-es-email"));
    }

    #[test]
    fn rejects_empty_email() {
        let err =
            validate_booking_input(&future_date(), "10:00 AM", "Ana", "   ", LIMA).unwrap_err();
        assert!(err.contains("no puede estar vacío"));
    }

    #[test]
    fn rejects_overlong_email() {
        let long = format!("{}@ejemplo.com", "a".repeat(250));
        let err =
            validate_booking_input(&future_date(), "10:00 AM", "Ana", &long, LIMA).unwrap_err();
        assert!(err.contains("demasiado largo"));
    }

    #[test]
    fn date_errors_win_over_later_fields() {
        // Field order: date, time, name, contact.
        let err = validate_booking_input("mala-fecha", "mala-hora", "1", "x", LIMA).unwrap_err();
        assert!(err.contains("fecha"));
    }

    #[test]
    fn accented_and_hyphenated_names_pass() {
        let input = validate_booking_input(
            &future_date(),
            "10:00 AM",
            "José Ñáñez-O'Higgins",
            "j@n.pe",
            LIMA,
        )
        .unwrap();
        assert!(input.customer_name.starts_with("José"));
    }
}
