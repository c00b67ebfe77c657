// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Promptlab configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptlabConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Model provider endpoint settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Identity service settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Defaults applied to test requests that omit optional fields.
    #[serde(default)]
    pub defaults: TestDefaultsConfig,

    /// Delegated AI analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8420
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat-completion provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// API key for the provider endpoint. Required to serve.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Deadline for a single-model test run.
    #[serde(default = "default_single_timeout_secs")]
    pub single_timeout_secs: u64,

    /// Shared deadline for a multi-model batch.
    #[serde(default = "default_batch_timeout_secs")]
    pub batch_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_provider_base_url(),
            single_timeout_secs: default_single_timeout_secs(),
            batch_timeout_secs: default_batch_timeout_secs(),
        }
    }
}

fn default_provider_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_single_timeout_secs() -> u64 {
    120
}

fn default_batch_timeout_secs() -> u64 {
    300
}

/// Identity service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Base URL of the identity service. Required to serve.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key sent alongside user tokens.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Tokens expiring within this many seconds are refreshed before use.
    #[serde(default = "default_refresh_margin_secs")]
    pub refresh_margin_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            refresh_margin_secs: default_refresh_margin_secs(),
        }
    }
}

fn default_refresh_margin_secs() -> u64 {
    300
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("promptlab").join("promptlab.db"))
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "promptlab.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

/// Defaults for optional test request fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestDefaultsConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TestDefaultsConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    1000
}

/// Delegated AI analysis configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Model used to evaluate prompts. Must be in the model registry.
    #[serde(default = "default_analysis_model")]
    pub model: String,

    /// Output budget for the evaluator's verdict.
    #[serde(default = "default_analysis_max_tokens")]
    pub max_tokens: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: default_analysis_model(),
            max_tokens: default_analysis_max_tokens(),
        }
    }
}

fn default_analysis_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_analysis_max_tokens() -> u32 {
    2000
}
