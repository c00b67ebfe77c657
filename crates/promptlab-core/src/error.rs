// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Promptlab.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Coarse error classification surfaced to API callers as `errorType`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// Missing or invalid configuration and secrets. Not retryable.
    Configuration,
    /// Malformed or out-of-range caller input.
    Validation,
    /// Expired, malformed or mismatched credentials.
    Authentication,
    /// Storage read or write failure.
    Database,
    /// Provider call failure, empty response, timeout or backend unavailability.
    Api,
    /// Anything else.
    Unexpected,
}

/// The primary error type used across all Promptlab adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PromptlabError {
    /// Configuration errors (missing secrets, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input failed validation. No network or storage call was made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Credential is expired and could not be refreshed.
    #[error("credential expired: {0}")]
    AuthExpired(String),

    /// Credential is structurally invalid.
    #[error("malformed credential: {0}")]
    AuthMalformed(String),

    /// The resolved identity does not match the credential subject.
    #[error("credential subject `{claimed}` does not match authenticated identity `{resolved}`")]
    AuthMismatch { claimed: String, resolved: String },

    /// The execution backend cannot accept work.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Storage backend errors (connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A record the operation depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// LLM provider errors. `message` carries the upstream error body verbatim.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider answered successfully but returned no completion choices.
    #[error("provider returned no completion choices for model `{model}`")]
    ProviderEmptyResponse { model: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Run was superseded by a newer run in the same caller context.
    #[error("run cancelled: {0}")]
    Cancelled(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PromptlabError {
    /// Shorthand for a storage error wrapping a plain message.
    pub fn storage(message: impl Into<String>) -> Self {
        PromptlabError::Storage {
            source: message.into().into(),
        }
    }

    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        PromptlabError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Maps this error onto the caller-facing taxonomy.
    pub fn error_type(&self) -> ErrorType {
        match self {
            PromptlabError::Config(_) => ErrorType::Configuration,
            PromptlabError::Validation(_) => ErrorType::Validation,
            PromptlabError::AuthExpired(_)
            | PromptlabError::AuthMalformed(_)
            | PromptlabError::AuthMismatch { .. } => ErrorType::Authentication,
            PromptlabError::Storage { .. } | PromptlabError::NotFound(_) => ErrorType::Database,
            PromptlabError::ServiceUnavailable(_)
            | PromptlabError::Provider { .. }
            | PromptlabError::ProviderEmptyResponse { .. }
            | PromptlabError::Timeout { .. } => ErrorType::Api,
            PromptlabError::Cancelled(_) | PromptlabError::Internal(_) => ErrorType::Unexpected,
        }
    }

    /// Fine-grained machine-readable code. Distinguishes timeouts from provider failures.
    pub fn error_code(&self) -> &'static str {
        match self {
            PromptlabError::Config(_) => "configuration",
            PromptlabError::Validation(_) => "invalid_request",
            PromptlabError::AuthExpired(_) => "auth_expired",
            PromptlabError::AuthMalformed(_) => "auth_malformed",
            PromptlabError::AuthMismatch { .. } => "auth_mismatch",
            PromptlabError::ServiceUnavailable(_) => "service_unavailable",
            PromptlabError::Storage { .. } => "storage",
            PromptlabError::NotFound(_) => "not_found",
            PromptlabError::Provider { .. } => "provider_error",
            PromptlabError::ProviderEmptyResponse { .. } => "empty_response",
            PromptlabError::Timeout { .. } => "timeout",
            PromptlabError::Cancelled(_) => "cancelled",
            PromptlabError::Internal(_) => "internal",
        }
    }

    /// Whether re-submitting the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PromptlabError::Timeout { .. }
                | PromptlabError::ServiceUnavailable(_)
                | PromptlabError::Provider { .. }
                | PromptlabError::Cancelled(_)
        )
    }
}
