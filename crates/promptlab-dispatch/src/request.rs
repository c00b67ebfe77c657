// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test invocation requests and their validation.
//!
//! Validation is pure: a rejected request never reaches the network or the
//! store.

use std::ops::RangeInclusive;

use promptlab_config::model::TestDefaultsConfig;
use promptlab_core::PromptlabError;
use promptlab_cost::ModelSpec;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.0..=2.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 1..=4000;

/// One prompt, one model.
#[derive(Debug, Clone)]
pub struct TestRequest {
    pub prompt_id: String,
    pub input: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// One prompt, one shared input, many models.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub prompt_id: String,
    pub input: String,
    pub models: Vec<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Sampling parameters after defaults are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl RunParams {
    pub fn resolve(
        temperature: Option<f64>,
        max_tokens: Option<u32>,
        defaults: &TestDefaultsConfig,
    ) -> Result<Self, PromptlabError> {
        let temperature = temperature.unwrap_or(defaults.temperature);
        if !temperature.is_finite() || !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(PromptlabError::Validation(format!(
                "temperature must be between 0 and 2, got {temperature}"
            )));
        }
        let max_tokens = max_tokens.unwrap_or(defaults.max_tokens);
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(PromptlabError::Validation(format!(
                "maxTokens must be between 1 and 4000, got {max_tokens}"
            )));
        }
        Ok(Self {
            temperature,
            max_tokens,
        })
    }
}

fn require_prompt_and_input(prompt_id: &str, input: &str) -> Result<(), PromptlabError> {
    if prompt_id.trim().is_empty() {
        return Err(PromptlabError::Validation("promptId is required".into()));
    }
    if input.trim().is_empty() {
        return Err(PromptlabError::Validation("testInput is required".into()));
    }
    Ok(())
}

impl TestRequest {
    pub fn validate(
        &self,
        defaults: &TestDefaultsConfig,
    ) -> Result<(ModelSpec, RunParams), PromptlabError> {
        require_prompt_and_input(&self.prompt_id, &self.input)?;
        let spec = promptlab_cost::lookup(&self.model)?;
        let params = RunParams::resolve(self.temperature, self.max_tokens, defaults)?;
        Ok((spec, params))
    }
}

impl BatchRequest {
    pub fn validate(
        &self,
        defaults: &TestDefaultsConfig,
    ) -> Result<(Vec<ModelSpec>, RunParams), PromptlabError> {
        require_prompt_and_input(&self.prompt_id, &self.input)?;
        let specs = promptlab_cost::validate_models(&self.models)?;
        let params = RunParams::resolve(self.temperature, self.max_tokens, defaults)?;
        Ok((specs, params))
    }
}
