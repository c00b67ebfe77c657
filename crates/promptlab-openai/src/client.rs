// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for an OpenAI-compatible Chat Completions endpoint.
//!
//! The client never retries. Callers own deadlines and re-submission.

use std::time::Duration;

use promptlab_core::PromptlabError;
use promptlab_core::types::HealthStatus;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, ChatRequest, ChatResponse};

/// Upper bound on a single HTTP exchange. Dispatch deadlines are shorter or equal.
const HTTP_TIMEOUT: Duration = Duration::from_secs(300);

/// Budget for the unbilled `GET /models` reachability check.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    models_endpoint: String,
}

impl ChatClient {
    /// Creates a client for `{base_url}/chat/completions`.
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, PromptlabError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                PromptlabError::Config(format!("invalid API key header value: {e}"))
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PromptlabError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let base_url = base_url.trim_end_matches('/');
        Ok(Self {
            client,
            endpoint: format!("{base_url}/chat/completions"),
            models_endpoint: format!("{base_url}/models"),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Checks that the endpoint answers `GET /models` with a 2xx.
    ///
    /// Unreachable hosts, timeouts and non-2xx answers are unhealthy.
    pub async fn check_models(&self) -> HealthStatus {
        let response = self
            .client
            .get(&self.models_endpoint)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => HealthStatus::Healthy,
            Ok(r) => {
                let status = r.status();
                warn!(status = %status, "provider health check rejected");
                HealthStatus::Unhealthy(format!("GET /models returned {status}"))
            }
            Err(e) => {
                warn!(error = %e, "provider unreachable");
                HealthStatus::Unhealthy(format!("provider unreachable: {e}"))
            }
        }
    }

    /// Sends one completion request.
    ///
    /// Non-2xx responses fail with [`PromptlabError::Provider`] carrying the
    /// status and the upstream body verbatim.
    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, PromptlabError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| PromptlabError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| PromptlabError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
                debug!(
                    status = %status,
                    error_type = api_err.error.type_.as_deref().unwrap_or("unknown"),
                    "provider rejected completion"
                );
            }
            return Err(PromptlabError::provider(format!("API returned {status}: {body}")));
        }

        serde_json::from_str(&body).map_err(|e| PromptlabError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
