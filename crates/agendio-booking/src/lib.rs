// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking coordination: field-level input validation, slot validation,
//! and the one non-retried calendar write.
//!
//! This is the single path in the workspace where correctness outweighs
//! availability: re-sending a write whose response was lost to a timeout
//! risks creating a duplicate real-world event, so [`BookingCoordinator`]
//! issues exactly one `CREAR_EVENTO` call and maps every failure into a
//! typed [`BookingOutcome`] for the conversational layer to relay.

pub mod coordinator;
pub mod input;

pub use coordinator::{
    BookingCoordinator, BookingErrorKind, BookingOutcome, BookingRequest, RejectionStage,
};
pub use input::{validate_booking_input, NormalizedInput};
