// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weekly-schedule model and booking-slot validation.
//!
//! The validation pipeline decides whether a requested `(date, time,
//! duration)` is bookable for a tenant: date/time syntax, no past
//! instants, the day's operating window, closing-time overrun, blackout
//! windows, then a live availability check against the booking calendar.
//!
//! Degradation policy is fail-open throughout the read path: when the
//! schedule or availability lookup cannot be confirmed because an upstream
//! dependency is down, the slot is treated as bookable rather than
//! blocking the user on a transient outage. The write path (event
//! creation) lives in `agendio-booking` and never fails open.

pub mod blackout;
pub mod model;
pub mod recommend;
pub mod validator;

pub use model::{
    day_name, day_name_title, format_time_12h, parse_time, parse_time_range, DayHours, TimeRange,
    WeeklySchedule,
};
pub use recommend::Recommendation;
pub use validator::{
    AvailabilityResult, ScheduleService, ScheduleSettings, ScheduleValidator, ValidationResult,
    ValidatorOptions,
};
