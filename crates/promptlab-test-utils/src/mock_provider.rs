// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat-completion provider for deterministic testing.
//!
//! Each model can be scripted to reply, fail, come back empty, or reply after
//! a delay. Unscripted models answer with `"mock response from {model}"`.
//! Every request is recorded before it is answered, so tests can observe
//! calls that are still in flight.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use promptlab_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse};
use promptlab_core::{PluginAdapter, PromptlabError, ProviderAdapter};

/// Scripted behaviour for one model.
#[derive(Debug, Clone)]
pub enum Scripted {
    Reply(String),
    /// Fails with a provider error carrying this body.
    Fail(String),
    /// Succeeds upstream with zero choices.
    Empty,
    Delay(Duration, String),
}

pub struct MockProvider {
    scripts: HashMap<String, Scripted>,
    health: HealthStatus,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            health: HealthStatus::Healthy,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn script(mut self, model: &str, behaviour: Scripted) -> Self {
        self.scripts.insert(model.to_string(), behaviour);
        self
    }

    pub fn reply(self, model: &str, text: &str) -> Self {
        self.script(model, Scripted::Reply(text.to_string()))
    }

    pub fn fail(self, model: &str, body: &str) -> Self {
        self.script(model, Scripted::Fail(body.to_string()))
    }

    pub fn empty(self, model: &str) -> Self {
        self.script(model, Scripted::Empty)
    }

    pub fn delay(self, model: &str, delay: Duration, text: &str) -> Self {
        self.script(model, Scripted::Delay(delay, text.to_string()))
    }

    pub fn unhealthy(mut self, reason: &str) -> Self {
        self.health = HealthStatus::Unhealthy(reason.to_string());
        self
    }

    pub fn degraded(mut self, reason: &str) -> Self {
        self.health = HealthStatus::Degraded(reason.to_string());
        self
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn calls_for(&self, model: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.model == model)
            .count()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptlabError> {
        Ok(self.health.clone())
    }

    async fn shutdown(&self) -> Result<(), PromptlabError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, PromptlabError> {
        let spec = promptlab_cost::lookup(&request.model)?;
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let behaviour = self.scripts.get(&request.model).cloned();
        let content = match behaviour {
            Some(Scripted::Reply(text)) => text,
            Some(Scripted::Fail(body)) => return Err(PromptlabError::provider(body)),
            Some(Scripted::Empty) => {
                return Err(PromptlabError::ProviderEmptyResponse {
                    model: request.model,
                });
            }
            Some(Scripted::Delay(delay, text)) => {
                tokio::time::sleep(delay).await;
                text
            }
            None => format!("mock response from {}", request.model),
        };

        Ok(ProviderResponse {
            content,
            model: request.model,
            cost_per_1k: spec.cost_per_1k,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(model: &str) -> ProviderRequest {
        ProviderRequest {
            model: model.to_string(),
            prompt: "prompt".to_string(),
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    #[tokio::test]
    async fn unscripted_model_gets_default_reply() {
        let provider = MockProvider::new();
        let resp = provider.complete(request("gpt-4o")).await.unwrap();
        assert_eq!(resp.content, "mock response from gpt-4o");
        assert!(resp.cost_per_1k > 0.0);
    }

    #[tokio::test]
    async fn scripts_are_per_model() {
        let provider = MockProvider::new()
            .reply("gpt-4o", "hello")
            .fail("gpt-4o-mini", "API returned 500: boom")
            .empty("claude-3-haiku");

        assert_eq!(provider.complete(request("gpt-4o")).await.unwrap().content, "hello");
        let err = provider.complete(request("gpt-4o-mini")).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        let err = provider.complete(request("claude-3-haiku")).await.unwrap_err();
        assert_eq!(err.error_code(), "empty_response");
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.calls_for("gpt-4o"), 1);
    }

    #[tokio::test]
    async fn unknown_model_is_rejected_unrecorded() {
        let provider = MockProvider::new();
        assert!(provider.complete(request("gpt-42")).await.is_err());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let provider = MockProvider::new().delay("gpt-4o", Duration::from_secs(5), "late");
        let start = tokio::time::Instant::now();
        let resp = provider.complete(request("gpt-4o")).await.unwrap();
        assert_eq!(resp.content, "late");
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn health_is_configurable() {
        let provider = MockProvider::new().unhealthy("down");
        assert_eq!(
            provider.health_check().await.unwrap(),
            HealthStatus::Unhealthy("down".into())
        );
    }
}
