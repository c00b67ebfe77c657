// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! All checks run and every failure is collected; validation does not fail fast.

use crate::diagnostic::ConfigError;
use crate::model::PromptlabConfig;

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &PromptlabConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(invalid("server.host must not be empty".to_string()));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(invalid(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if !VALID_LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(invalid(format!(
            "server.log_level must be one of {}, got `{}`",
            VALID_LOG_LEVELS.join(", "),
            config.server.log_level
        )));
    }

    if !is_http_url(&config.provider.base_url) {
        errors.push(invalid(format!(
            "provider.base_url must be an http(s) URL, got `{}`",
            config.provider.base_url
        )));
    }

    if config.provider.single_timeout_secs == 0 {
        errors.push(invalid("provider.single_timeout_secs must be positive".to_string()));
    }
    if config.provider.batch_timeout_secs == 0 {
        errors.push(invalid("provider.batch_timeout_secs must be positive".to_string()));
    }

    if let Some(url) = &config.auth.base_url {
        if !is_http_url(url) {
            errors.push(invalid(format!(
                "auth.base_url must be an http(s) URL, got `{url}`"
            )));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty".to_string()));
    }

    if !(0.0..=2.0).contains(&config.defaults.temperature) {
        errors.push(invalid(format!(
            "defaults.temperature must be within [0, 2], got {}",
            config.defaults.temperature
        )));
    }
    if !(1..=4000).contains(&config.defaults.max_tokens) {
        errors.push(invalid(format!(
            "defaults.max_tokens must be within [1, 4000], got {}",
            config.defaults.max_tokens
        )));
    }

    if config.analysis.model.trim().is_empty() {
        errors.push(invalid("analysis.model must not be empty".to_string()));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Check that the secrets required to serve traffic are present.
///
/// Loading config never requires secrets (so `promptlab config` works anywhere);
/// this runs before the server starts.
pub fn require_secrets(config: &PromptlabConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if is_blank(config.provider.api_key.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "provider.api_key".to_string(),
        });
    }
    if is_blank(config.auth.base_url.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "auth.base_url".to_string(),
        });
    }
    if is_blank(config.auth.api_key.as_deref()) {
        errors.push(ConfigError::MissingKey {
            key: "auth.api_key".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation { message }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
