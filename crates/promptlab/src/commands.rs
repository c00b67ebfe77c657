// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline subcommands: `analyze`, `models` and `config`.

use std::fmt::Write as _;
use std::io::Read;

use promptlab_config::PromptlabConfig;
use promptlab_core::PromptlabError;
use promptlab_scoring::TechniqueEngine;

const REDACTED: &str = "[redacted]";

/// Read prompt text from `input`, where `-` means stdin.
pub fn read_prompt(input: &str) -> Result<String, PromptlabError> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| PromptlabError::Validation(format!("cannot read stdin: {e}")))?;
        return Ok(text);
    }
    std::fs::read_to_string(input)
        .map_err(|e| PromptlabError::Validation(format!("cannot read `{input}`: {e}")))
}

pub fn analyze_report(text: &str, json: bool) -> Result<String, PromptlabError> {
    let analysis = TechniqueEngine::new().analyze(text);
    if json {
        return serde_json::to_string_pretty(&analysis)
            .map_err(|e| PromptlabError::Internal(format!("failed to encode analysis: {e}")));
    }

    let mut out = String::new();
    let _ = writeln!(out, "score: {}/11 ({})", analysis.overall_score, analysis.color_code);
    let _ = writeln!(out, "{}", analysis.summary);
    let _ = writeln!(out);
    for technique in &analysis.techniques {
        let mark = if technique.present { "x" } else { " " };
        let _ = writeln!(out, "[{mark}] {:<24} {:.2}", technique.name, technique.score);
    }
    if !analysis.suggestions.is_empty() {
        let _ = writeln!(out, "\nsuggestions:");
        for suggestion in &analysis.suggestions {
            let _ = writeln!(out, "  - {suggestion}");
        }
    }
    Ok(out.trim_end().to_string())
}

pub fn models_report(json: bool) -> Result<String, PromptlabError> {
    let models = promptlab_cost::registry::all();
    if json {
        return serde_json::to_string_pretty(&models)
            .map_err(|e| PromptlabError::Internal(format!("failed to encode models: {e}")));
    }
    let mut out = String::new();
    for spec in models {
        let _ = writeln!(
            out,
            "{:<20} {:<10} ${}/1k tokens",
            spec.id.to_string(),
            spec.provider,
            spec.cost_per_1k
        );
    }
    Ok(out.trim_end().to_string())
}

/// The effective configuration as TOML with secrets masked.
pub fn redacted_config(config: &PromptlabConfig) -> Result<String, PromptlabError> {
    let mut shown = config.clone();
    if shown.provider.api_key.is_some() {
        shown.provider.api_key = Some(REDACTED.to_string());
    }
    if shown.auth.api_key.is_some() {
        shown.auth.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| PromptlabError::Internal(format!("failed to render config: {e}")))
}
