// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Promptlab integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Per-model scripted replies, failures, empty responses and delays
//! - [`MockAuth`] - Identity resolution and refresh with call counting
//! - [`TokenBuilder`] - Unsigned bearer tokens with chosen subject and expiry
//! - [`TestHarness`] - Temp SQLite storage wired to both dispatchers and the resolver

pub mod fixtures;
pub mod harness;
pub mod mock_auth;
pub mod mock_provider;
pub mod tokens;

pub use fixtures::{seed_prompt, test_storage_config};
pub use harness::TestHarness;
pub use mock_auth::MockAuth;
pub use mock_provider::{MockProvider, Scripted};
pub use tokens::TokenBuilder;
