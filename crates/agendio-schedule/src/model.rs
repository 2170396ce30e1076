// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed weekly schedule parsed from the upstream's free-form day strings.
//!
//! The upstream stores one string per weekday (`"10:00-19:00"`, a closed
//! marker like `"CERRADO"`, or null). Parsing happens once, at fetch time,
//! so the validator only ever sees a typed [`DayHours`]: a malformed or
//! inverted range becomes [`DayHours::Unparsed`] (which fails open) and
//! never reaches the comparison logic.

use chrono::{NaiveTime, Weekday};

use agendio_upstream::RawWeeklySchedule;

/// Day markers the upstream uses for "no service this day".
const CLOSED_MARKERS: [&str; 5] = ["NO DISPONIBLE", "CERRADO", "NO ATIENDE", "-", "N/A"];

/// Accepted time formats: 12-hour with AM/PM (spaced or not) and 24-hour.
const TIME_FORMATS: [&str; 3] = ["%I:%M %p", "%I:%M%p", "%H:%M"];

/// An ordered open/close pair within one day (`open < close`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TimeRange {
    /// Returns the range only when it is properly ordered.
    pub fn new(open: NaiveTime, close: NaiveTime) -> Option<Self> {
        (open < close).then_some(Self { open, close })
    }

    /// `"09:00 AM a 06:00 PM"`, the form quoted back to end users.
    pub fn display_es(&self) -> String {
        format!(
            "{} a {}",
            format_time_12h(self.open),
            format_time_12h(self.close)
        )
    }
}

/// Operating hours for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayHours {
    /// No entry at all for this day.
    Missing,
    /// Explicitly marked closed (`CERRADO`, `NO ATIENDE`, ...).
    Closed,
    /// A valid operating window.
    Open(TimeRange),
    /// Present but unreadable; the validator fails open on it.
    Unparsed,
}

#[derive(Debug, Clone)]
struct DayEntry {
    raw: Option<String>,
    hours: DayHours,
}

/// A tenant's weekly operating schedule plus its blackout descriptor.
///
/// Immutable once fetched; replaced wholesale when the cache entry expires
/// and a refetch happens.
#[derive(Debug, Clone)]
pub struct WeeklySchedule {
    /// Monday-first.
    days: Vec<DayEntry>,
    blackouts: Option<serde_json::Value>,
}

impl WeeklySchedule {
    /// Parses the upstream's raw day strings into typed day hours.
    pub fn from_raw(raw: RawWeeklySchedule) -> Self {
        let days = [
            raw.reunion_lunes,
            raw.reunion_martes,
            raw.reunion_miercoles,
            raw.reunion_jueves,
            raw.reunion_viernes,
            raw.reunion_sabado,
            raw.reunion_domingo,
        ]
        .into_iter()
        .map(|value| DayEntry {
            hours: parse_day_hours(value.as_deref()),
            raw: value,
        })
        .collect();
        Self {
            days,
            blackouts: raw.horarios_bloqueados,
        }
    }

    /// The typed hours for a weekday.
    pub fn day_hours(&self, weekday: Weekday) -> DayHours {
        self.days[weekday.num_days_from_monday() as usize].hours
    }

    /// The blackout descriptor, verbatim from the upstream.
    pub fn blackouts(&self) -> Option<&serde_json::Value> {
        self.blackouts.as_ref()
    }

    /// Per-day listing for prompt injection:
    /// `- Lunes: 10:00 - 19:00` or `- Lunes: Cerrado` per line.
    pub fn prompt_lines(&self) -> String {
        let mut lines = Vec::with_capacity(7);
        for (index, entry) in self.days.iter().enumerate() {
            let name = DAY_NAMES_TITLE[index];
            match entry.raw.as_deref().map(str::trim) {
                Some(value) if !value.is_empty() && !is_closed_marker(value) => {
                    lines.push(format!("- {}: {}", name, value.replace('-', " - ")));
                }
                _ => lines.push(format!("- {name}: Cerrado")),
            }
        }
        lines.join("\n")
    }
}

fn parse_day_hours(value: Option<&str>) -> DayHours {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return DayHours::Missing;
    };
    if is_closed_marker(value) {
        return DayHours::Closed;
    }
    match parse_time_range(value) {
        Some(range) => DayHours::Open(range),
        None => DayHours::Unparsed,
    }
}

fn is_closed_marker(value: &str) -> bool {
    let upper = value.trim().to_uppercase();
    CLOSED_MARKERS.contains(&upper.as_str())
}

/// Parses `"HH:MM AM/PM"` or `"HH:MM"` (case-insensitive) into a time.
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let normalized = value.trim().to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&normalized, fmt).ok())
}

/// Parses `"09:00-18:00"` or `"9:00 AM - 6:00 PM"` into an ordered range.
pub fn parse_time_range(value: &str) -> Option<TimeRange> {
    if value.trim().is_empty() {
        return None;
    }
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let parts: Vec<&str> = compact.split('-').collect();
    let (start, end) = if parts.len() == 2 {
        (parts[0].to_string(), parts[1].to_string())
    } else {
        let spaced: Vec<&str> = value.split(" - ").collect();
        if spaced.len() != 2 {
            return None;
        }
        (spaced[0].to_string(), spaced[1].to_string())
    };
    TimeRange::new(parse_time(&start)?, parse_time(&end)?)
}

/// `"02:30 PM"` -- the 12-hour form used in user-facing messages.
pub fn format_time_12h(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

const DAY_NAMES: [&str; 7] = [
    "lunes",
    "martes",
    "miércoles",
    "jueves",
    "viernes",
    "sábado",
    "domingo",
];

const DAY_NAMES_TITLE: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Lowercase Spanish day name, as quoted inside rejection reasons.
pub fn day_name(weekday: Weekday) -> &'static str {
    DAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Capitalized Spanish day name, for suggestion and prompt formatting.
pub fn day_name_title(weekday: Weekday) -> &'static str {
    DAY_NAMES_TITLE[weekday.num_days_from_monday() as usize]
}
