// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock identity service.
//!
//! Resolves a token to the identity named by its own subject claim unless a
//! fixed identity is configured. Refresh tokens of the form
//! `refresh-{sub}` are exchanged for a fresh one-hour token for `sub`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use promptlab_auth::{decode_claims, encode_unsigned};
use promptlab_core::types::{
    AdapterType, AuthIdentity, AuthToken, Claims, HealthStatus, RefreshedToken,
};
use promptlab_core::{AuthAdapter, PluginAdapter, PromptlabError};

use crate::tokens::refresh_token_for;

#[derive(Default)]
pub struct MockAuth {
    fixed_identity: Option<String>,
    refresh_fails: bool,
    authenticate_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    refreshed_subjects: Mutex<Vec<String>>,
}

impl MockAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every token to `user_id`, regardless of its claims.
    pub fn with_identity(mut self, user_id: &str) -> Self {
        self.fixed_identity = Some(user_id.to_string());
        self
    }

    /// Reject every refresh exchange.
    pub fn failing_refresh(mut self) -> Self {
        self.refresh_fails = true;
        self
    }

    pub fn authenticate_count(&self) -> usize {
        self.authenticate_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn refreshed_subjects(&self) -> Vec<String> {
        self.refreshed_subjects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl PluginAdapter for MockAuth {
    fn name(&self) -> &str {
        "mock-auth"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Auth
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptlabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PromptlabError> {
        Ok(())
    }
}

#[async_trait]
impl AuthAdapter for MockAuth {
    async fn authenticate(&self, token: &AuthToken) -> Result<AuthIdentity, PromptlabError> {
        self.authenticate_calls.fetch_add(1, Ordering::SeqCst);
        let user_id = match &self.fixed_identity {
            Some(id) => id.clone(),
            None => decode_claims(token)?.sub,
        };
        Ok(AuthIdentity {
            email: Some(format!("{user_id}@example.test")),
            user_id,
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, PromptlabError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fails {
            return Err(PromptlabError::AuthExpired("refresh token revoked".into()));
        }
        let sub = refresh_token
            .strip_prefix("refresh-")
            .ok_or_else(|| PromptlabError::AuthMalformed("unknown refresh token".into()))?;
        self.refreshed_subjects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sub.to_string());

        let now = chrono::Utc::now().timestamp();
        let access_token = encode_unsigned(&Claims {
            sub: sub.to_string(),
            iat: now,
            exp: now + 3600,
        });
        Ok(RefreshedToken {
            access_token,
            refresh_token: Some(refresh_token_for(sub)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TokenBuilder;

    #[tokio::test]
    async fn resolves_subject_from_token() {
        let auth = MockAuth::new();
        let identity = auth.authenticate(&TokenBuilder::new("u1").token()).await.unwrap();
        assert_eq!(identity.user_id, "u1");
        assert_eq!(auth.authenticate_count(), 1);
    }

    #[tokio::test]
    async fn fixed_identity_overrides_claims() {
        let auth = MockAuth::new().with_identity("someone-else");
        let identity = auth.authenticate(&TokenBuilder::new("u1").token()).await.unwrap();
        assert_eq!(identity.user_id, "someone-else");
    }

    #[tokio::test]
    async fn refresh_issues_token_for_same_subject() {
        let auth = MockAuth::new();
        let fresh = auth.refresh("refresh-u1").await.unwrap();
        assert_eq!(decode_claims(&fresh.access_token).unwrap().sub, "u1");
        assert_eq!(auth.refresh_count(), 1);
        assert_eq!(auth.refreshed_subjects(), vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn failing_refresh_still_counts() {
        let auth = MockAuth::new().failing_refresh();
        assert!(auth.refresh("refresh-u1").await.is_err());
        assert_eq!(auth.refresh_count(), 1);
    }
}
