// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP adapter for a GoTrue-style identity service.
//!
//! - `GET  {base}/auth/v1/user` resolves a bearer token to a user.
//! - `POST {base}/auth/v1/token?grant_type=refresh_token` exchanges a refresh token.
//! - `GET  {base}/auth/v1/health` reports service health.

use std::time::Duration;

use async_trait::async_trait;
use promptlab_config::model::AuthConfig;
use promptlab_core::PromptlabError;
use promptlab_core::traits::{AuthAdapter, PluginAdapter};
use promptlab_core::types::{AdapterType, AuthIdentity, AuthToken, HealthStatus, RefreshedToken};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Identity service adapter.
pub struct RemoteAuthAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteAuthAdapter {
    /// Creates the adapter. Both `auth.base_url` and `auth.api_key` are required.
    pub fn new(config: &AuthConfig) -> Result<Self, PromptlabError> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PromptlabError::Config("auth.base_url is not set".to_string()))?;
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| PromptlabError::Config("auth.api_key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PromptlabError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn unreachable(e: reqwest::Error) -> PromptlabError {
        PromptlabError::ServiceUnavailable(format!("identity service unreachable: {e}"))
    }
}

#[async_trait]
impl PluginAdapter for RemoteAuthAdapter {
    fn name(&self) -> &str {
        "remote-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptlabError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/health", self.base_url))
            .header("apikey", &self.api_key)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        Ok(match response {
            Ok(r) if r.status().is_success() => HealthStatus::Healthy,
            Ok(r) => HealthStatus::Unhealthy(format!("identity service returned {}", r.status())),
            Err(e) => HealthStatus::Unhealthy(format!("identity service unreachable: {e}")),
        })
    }

    async fn shutdown(&self) -> Result<(), PromptlabError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for RemoteAuthAdapter {
    async fn authenticate(&self, token: &AuthToken) -> Result<AuthIdentity, PromptlabError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.api_key)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = response.status();
        debug!(status = %status, "identity lookup response");
        match status {
            s if s.is_success() => {
                let user: UserResponse = response.json().await.map_err(|e| {
                    PromptlabError::AuthMalformed(format!("unexpected identity response: {e}"))
                })?;
                Ok(AuthIdentity {
                    user_id: user.id,
                    email: user.email,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PromptlabError::AuthExpired(
                "identity service rejected the credential".to_string(),
            )),
            other => {
                let body = response.text().await.unwrap_or_default();
                Err(PromptlabError::ServiceUnavailable(format!(
                    "identity service returned {other}: {body}"
                )))
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, PromptlabError> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token?grant_type=refresh_token", self.base_url))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(Self::unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PromptlabError::AuthExpired(format!(
                "refresh rejected ({status}): {body}"
            )));
        }

        let tokens: TokenResponse = response.json().await.map_err(|e| {
            PromptlabError::AuthMalformed(format!("unexpected refresh response: {e}"))
        })?;
        Ok(RefreshedToken {
            access_token: AuthToken(tokens.access_token),
            refresh_token: tokens.refresh_token,
        })
    }
}
