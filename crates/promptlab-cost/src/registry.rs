// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static model table.
//!
//! Rates are USD per 1000 tokens, blended across input and output.

use std::collections::HashSet;
use std::str::FromStr;

use promptlab_core::PromptlabError;
use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Every model the service can dispatch to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
)]
pub enum ModelId {
    #[strum(serialize = "gpt-4o")]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[strum(serialize = "gpt-4o-mini")]
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[strum(serialize = "gpt-4-turbo")]
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[strum(serialize = "gpt-3.5-turbo")]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[strum(serialize = "claude-3-5-sonnet")]
    #[serde(rename = "claude-3-5-sonnet")]
    Claude35Sonnet,
    #[strum(serialize = "claude-3-haiku")]
    #[serde(rename = "claude-3-haiku")]
    Claude3Haiku,
}

/// Registry entry for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelSpec {
    pub id: ModelId,
    /// Upstream vendor, informational only.
    pub provider: &'static str,
    pub cost_per_1k: f64,
}

impl ModelId {
    /// Registry entry for this model. The match is exhaustive, so adding a
    /// variant without a rate fails to compile.
    pub fn spec(self) -> ModelSpec {
        let (provider, cost_per_1k) = match self {
            ModelId::Gpt4o => ("openai", 0.005),
            ModelId::Gpt4oMini => ("openai", 0.000_15),
            ModelId::Gpt4Turbo => ("openai", 0.01),
            ModelId::Gpt35Turbo => ("openai", 0.0015),
            ModelId::Claude35Sonnet => ("anthropic", 0.003),
            ModelId::Claude3Haiku => ("anthropic", 0.000_25),
        };
        ModelSpec {
            id: self,
            provider,
            cost_per_1k,
        }
    }
}

/// All registry entries in declaration order.
pub fn all() -> Vec<ModelSpec> {
    ModelId::iter().map(ModelId::spec).collect()
}

/// Exact-match lookup. Unknown identifiers are a validation error.
pub fn lookup(model: &str) -> Result<ModelSpec, PromptlabError> {
    ModelId::from_str(model)
        .map(ModelId::spec)
        .map_err(|_| PromptlabError::Validation(format!("unsupported model `{model}`")))
}

/// Validates the model list of a multi-model request.
///
/// The list must be non-empty, every member must be known and no model may
/// appear twice.
pub fn validate_models(models: &[String]) -> Result<Vec<ModelSpec>, PromptlabError> {
    if models.is_empty() {
        return Err(PromptlabError::Validation(
            "at least one model must be selected".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(models.len());
    for model in models {
        let spec = lookup(model)?;
        if !seen.insert(spec.id) {
            return Err(PromptlabError::Validation(format!(
                "model `{model}` selected more than once"
            )));
        }
        specs.push(spec);
    }
    Ok(specs)
}

/// Startup self-check of the static table.
///
/// Every identifier must round-trip through its string form and carry a
/// positive, finite rate.
pub fn verify() -> Result<(), PromptlabError> {
    for spec in all() {
        let name = spec.id.to_string();
        let parsed = ModelId::from_str(&name).map_err(|_| {
            PromptlabError::Config(format!("model `{name}` does not parse back to itself"))
        })?;
        if parsed != spec.id {
            return Err(PromptlabError::Config(format!(
                "model `{name}` parses to a different identifier"
            )));
        }
        if !(spec.cost_per_1k.is_finite() && spec.cost_per_1k > 0.0) {
            return Err(PromptlabError::Config(format!(
                "model `{name}` has invalid rate {}",
                spec.cost_per_1k
            )));
        }
    }
    tracing::debug!(models = ModelId::iter().count(), "model registry verified");
    Ok(())
}
