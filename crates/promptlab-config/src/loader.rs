// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./promptlab.toml` > `~/.config/promptlab/promptlab.toml` >
//! `/etc/promptlab/promptlab.toml` with environment variable overrides via `PROMPTLAB_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PromptlabConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/promptlab/promptlab.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "promptlab.toml";
pub(crate) const USER_CONFIG_SUFFIX: &str = "promptlab/promptlab.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/promptlab/promptlab.toml` (system-wide)
/// 3. `~/.config/promptlab/promptlab.toml` (user XDG config)
/// 4. `./promptlab.toml` (local directory)
/// 5. `PROMPTLAB_*` environment variables
pub fn load_config() -> Result<PromptlabConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PromptlabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PromptlabConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PromptlabConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PromptlabConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PromptlabConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join(USER_CONFIG_SUFFIX))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that underscore-containing
/// keys survive: `PROMPTLAB_PROVIDER_API_KEY` maps to `provider.api_key`.
fn env_provider() -> Env {
    Env::prefixed("PROMPTLAB_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &[
        "server", "provider", "auth", "storage", "defaults", "analysis",
    ];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section) {
            if let Some(field) = rest.strip_prefix('_') {
                return format!("{section}.{field}");
            }
        }
    }
    key.to_string()
}
