// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Promptlab.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the workspace. Provider, storage and auth
//! adapters implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorType, PromptlabError};
pub use types::{AdapterType, HealthStatus, TokenUsage};

pub use traits::{AuthAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};
