// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Defensive parsing of the upstream's blocked-hours descriptor.
//!
//! The descriptor arrives in whatever shape the tenant configured: a JSON
//! array of `{fecha, inicio, fin}` objects, a JSON string containing that
//! array, or a comma-separated list of `"YYYY-MM-DD HH:MM-HH:MM"` entries.
//! Unparseable entries are skipped, never fatal -- a garbled blackout rule
//! must not block (or unblock) unrelated slots.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use tracing::debug;

use crate::model::{parse_time, parse_time_range};

/// Whether the requested `[start, end)` window on `date` intersects any
/// blackout entry for that date.
pub fn is_window_blocked(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    descriptor: &Value,
) -> bool {
    let entries = normalize_entries(descriptor);
    if entries.is_empty() {
        return false;
    }

    let date_str = date.format("%Y-%m-%d").to_string();
    for entry in &entries {
        let window = match entry {
            Value::Object(obj) => {
                if obj.get("fecha").and_then(Value::as_str) != Some(date_str.as_str()) {
                    continue;
                }
                let inicio = obj.get("inicio").and_then(Value::as_str).and_then(parse_time);
                let fin = obj.get("fin").and_then(Value::as_str).and_then(parse_time);
                match (inicio, fin) {
                    (Some(inicio), Some(fin)) => Some((inicio, fin)),
                    _ => None,
                }
            }
            Value::String(s) if s.contains(&date_str) => {
                let time_part = s.replace(&date_str, "");
                parse_time_range(time_part.trim()).map(|r| (r.open, r.close))
            }
            _ => None,
        };

        if let Some((blackout_start, blackout_end)) = window
            && blackout_start < end
            && start < blackout_end
        {
            debug!(date = %date_str, start = %start, "requested window hits a blackout");
            return true;
        }
    }
    false
}

/// Flattens the descriptor into individual entries, whatever its shape.
fn normalize_entries(descriptor: &Value) -> Vec<Value> {
    match descriptor {
        Value::Array(items) => items.clone(),
        Value::String(s) if !s.trim().is_empty() => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            Ok(single) => vec![single],
            Err(_) => s
                .split(',')
                .map(|part| Value::String(part.trim().to_string()))
                .collect(),
        },
        _ => Vec::new(),
    }
}
