// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the upstream business APIs.
//!
//! The upstream systems expose three endpoints taking operation-code-tagged
//! JSON bodies (`codOpe`): an information endpoint (weekly schedules,
//! business context, product/service names), a booking endpoint
//! (availability checks and slot suggestions), and a calendar endpoint
//! (event creation). A fourth endpoint serves FAQs keyed by chatbot id.
//!
//! [`ApiClient`] owns one pooled [`reqwest::Client`] shared by every call.
//! Reads are plain single attempts here -- retry, backoff, and circuit
//! breaking are layered on by `agendio-resilience` at the call sites.
//! [`ApiClient::create_event`] is the single non-idempotent write: it runs
//! with its own, longer timeout and is never wrapped in a retry.

pub mod client;
pub mod types;

pub use client::{ApiClient, ApiSettings};
pub use types::{
    AvailabilityQuery, CreateEventRequest, CreateEventResponse, FaqItem, RawWeeklySchedule,
    SlotSuggestion, SuggestQuery, SuggestResponse,
};
