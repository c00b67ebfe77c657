// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible provider adapter for Promptlab.
//!
//! Implements [`ProviderAdapter`] for any endpoint speaking the Chat
//! Completions protocol. The per-1000-token rate comes from the model
//! registry; cost and latency bookkeeping is left to the caller.

pub mod client;
pub mod types;

use async_trait::async_trait;
use promptlab_config::model::ProviderConfig;
use promptlab_core::error::PromptlabError;
use promptlab_core::traits::{PluginAdapter, ProviderAdapter};
use promptlab_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use tracing::{debug, info};

use crate::client::ChatClient;
use crate::types::{ChatMessage, ChatRequest};

/// Provider implementing [`ProviderAdapter`] over [`ChatClient`].
pub struct OpenAiProvider {
    client: ChatClient,
}

impl OpenAiProvider {
    /// Creates a provider from configuration.
    ///
    /// A missing API key is a configuration error.
    pub fn new(config: &ProviderConfig) -> Result<Self, PromptlabError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PromptlabError::Config("provider.api_key is not set".to_string()))?;

        let client = ChatClient::new(api_key, &config.base_url)?;
        info!(endpoint = client.endpoint(), "chat completion provider initialized");
        Ok(Self { client })
    }

    fn to_chat_request(request: &ProviderRequest) -> ChatRequest {
        ChatRequest {
            model: request.model.clone(),
            messages: vec![ChatMessage::user(request.prompt.clone())],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    /// `GET /models` rather than a completion, which would be billed.
    async fn health_check(&self) -> Result<HealthStatus, PromptlabError> {
        Ok(self.client.check_models().await)
    }

    async fn shutdown(&self) -> Result<(), PromptlabError> {
        debug!("chat completion provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PromptlabError> {
        let spec = promptlab_cost::lookup(&request.model)?;
        let response = self.client.complete(&Self::to_chat_request(&request)).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PromptlabError::ProviderEmptyResponse {
                model: request.model.clone(),
            })?;

        Ok(ProviderResponse {
            content: choice.message.content.unwrap_or_default(),
            model: request.model,
            cost_per_1k: spec.cost_per_1k,
        })
    }
}
