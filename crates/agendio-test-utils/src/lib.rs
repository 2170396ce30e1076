// SPDX-FileCopyrightText: 2026 Agendio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Agendio integration tests.
//!
//! Provides [`MockBusinessApi`], a wiremock-backed stand-in for the three
//! upstream business endpoints plus the FAQ endpoint, so tests run fast,
//! deterministic, and CI-runnable without external services.

pub mod mock_api;

pub use mock_api::MockBusinessApi;
