// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session validation with a single near-expiry refresh.

use std::sync::Arc;
use std::time::Duration;

use promptlab_core::PromptlabError;
use promptlab_core::traits::AuthAdapter;
use promptlab_core::types::{AuthIdentity, AuthToken, Credential};
use tracing::{debug, info, warn};

use crate::claims::decode_claims;

/// Default window before expiry in which a token is refreshed.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Outcome of a successful validation.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub identity: AuthIdentity,
    /// The token to use downstream. Differs from the presented one after a refresh.
    pub token: AuthToken,
    /// Set when a refresh exchange produced a new token pair.
    pub refreshed_token: Option<String>,
    pub refreshed: bool,
}

/// Validates caller credentials before any billable work starts.
pub struct SessionValidator {
    auth: Arc<dyn AuthAdapter>,
    refresh_margin: Duration,
}

impl SessionValidator {
    pub fn new(auth: Arc<dyn AuthAdapter>) -> Self {
        Self {
            auth,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
        }
    }

    pub fn with_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Validate `credential` against the current wall clock.
    pub async fn validate(&self, credential: &Credential) -> Result<ValidatedSession, PromptlabError> {
        self.validate_at(credential, chrono::Utc::now().timestamp()).await
    }

    /// Validate `credential` as of `now` (seconds since the Unix epoch).
    ///
    /// 1. An already-expired token fails with `AuthExpired` without a network call.
    /// 2. A token expiring within the refresh margin is refreshed exactly once;
    ///    a missing refresh token or a failed exchange is `AuthExpired`.
    /// 3. The identity service resolves the (possibly refreshed) token and its
    ///    subject must equal the claim subject, else `AuthMismatch`.
    pub async fn validate_at(
        &self,
        credential: &Credential,
        now: i64,
    ) -> Result<ValidatedSession, PromptlabError> {
        let claims = &credential.claims;
        if claims.exp <= now {
            debug!(sub = %claims.sub, exp = claims.exp, "credential already expired");
            return Err(PromptlabError::AuthExpired(
                "credential has expired; sign in again".to_string(),
            ));
        }

        let margin = i64::try_from(self.refresh_margin.as_secs()).unwrap_or(i64::MAX);
        let mut token = credential.token.clone();
        let mut refreshed_token = None;
        let mut refreshed = false;

        if claims.exp - now <= margin {
            let refresh_token = credential.refresh_token.as_deref().ok_or_else(|| {
                PromptlabError::AuthExpired(
                    "credential is about to expire and no refresh token was supplied".to_string(),
                )
            })?;

            info!(sub = %claims.sub, seconds_left = claims.exp - now, "refreshing credential");
            let fresh = self.auth.refresh(refresh_token).await.map_err(|e| {
                warn!(sub = %claims.sub, error = %e, "credential refresh failed");
                PromptlabError::AuthExpired(format!("credential refresh failed: {e}"))
            })?;

            let fresh_claims = decode_claims(&fresh.access_token)?;
            if fresh_claims.sub != claims.sub {
                return Err(PromptlabError::AuthMismatch {
                    claimed: claims.sub.clone(),
                    resolved: fresh_claims.sub,
                });
            }
            token = fresh.access_token;
            refreshed_token = fresh.refresh_token;
            refreshed = true;
        }

        let identity = self.auth.authenticate(&token).await?;
        if identity.user_id != claims.sub {
            warn!(
                claimed = %claims.sub,
                resolved = %identity.user_id,
                "identity does not match credential subject"
            );
            return Err(PromptlabError::AuthMismatch {
                claimed: claims.sub.clone(),
                resolved: identity.user_id,
            });
        }

        Ok(ValidatedSession {
            identity,
            token,
            refreshed_token,
            refreshed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::encode_unsigned;
    use async_trait::async_trait;
    use promptlab_core::types::{AdapterType, Claims, HealthStatus, RefreshedToken};
    use promptlab_core::PluginAdapter;
    use std::sync::atomic::{AtomicU32, Ordering};

    const NOW: i64 = 1_800_000_000;

    struct CountingAuth {
        resolve_as: String,
        refresh_ok: bool,
        refreshes: AtomicU32,
        authentications: AtomicU32,
    }

    impl CountingAuth {
        fn new(resolve_as: &str) -> Self {
            Self {
                resolve_as: resolve_as.to_string(),
                refresh_ok: true,
                refreshes: AtomicU32::new(0),
                authentications: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for CountingAuth {
        fn name(&self) -> &str {
            "counting"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
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
    impl AuthAdapter for CountingAuth {
        async fn authenticate(&self, _token: &AuthToken) -> Result<AuthIdentity, PromptlabError> {
            self.authentications.fetch_add(1, Ordering::SeqCst);
            Ok(AuthIdentity {
                user_id: self.resolve_as.clone(),
                email: None,
            })
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<RefreshedToken, PromptlabError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            if !self.refresh_ok {
                return Err(PromptlabError::AuthExpired("refresh token revoked".into()));
            }
            Ok(RefreshedToken {
                access_token: encode_unsigned(&Claims {
                    sub: self.resolve_as.clone(),
                    iat: NOW,
                    exp: NOW + 3600,
                }),
                refresh_token: Some("rt-2".into()),
            })
        }
    }

    fn credential(sub: &str, exp_in: i64, refresh: Option<&str>) -> Credential {
        let claims = Claims {
            sub: sub.to_string(),
            iat: NOW - 60,
            exp: NOW + exp_in,
        };
        Credential {
            token: encode_unsigned(&claims),
            claims,
            refresh_token: refresh.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn ten_minutes_left_accepted_without_refresh() {
        let auth = Arc::new(CountingAuth::new("u1"));
        let validator = SessionValidator::new(auth.clone());
        let session = validator
            .validate_at(&credential("u1", 600, Some("rt")), NOW)
            .await
            .unwrap();
        assert!(!session.refreshed);
        assert_eq!(session.identity.user_id, "u1");
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn two_minutes_left_triggers_exactly_one_refresh() {
        let auth = Arc::new(CountingAuth::new("u1"));
        let validator = SessionValidator::new(auth.clone());
        let cred = credential("u1", 120, Some("rt"));
        let session = validator.validate_at(&cred, NOW).await.unwrap();
        assert!(session.refreshed);
        assert_ne!(session.token, cred.token);
        assert_eq!(session.refreshed_token.as_deref(), Some("rt-2"));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_token_fails_without_network() {
        let auth = Arc::new(CountingAuth::new("u1"));
        let validator = SessionValidator::new(auth.clone());
        let err = validator
            .validate_at(&credential("u1", -1, Some("rt")), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptlabError::AuthExpired(_)));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(auth.authentications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn near_expiry_without_refresh_token_is_expired() {
        let auth = Arc::new(CountingAuth::new("u1"));
        let validator = SessionValidator::new(auth.clone());
        let err = validator
            .validate_at(&credential("u1", 60, None), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptlabError::AuthExpired(_)));
    }

    #[tokio::test]
    async fn failed_refresh_is_expired_and_not_retried() {
        let mut auth = CountingAuth::new("u1");
        auth.refresh_ok = false;
        let auth = Arc::new(auth);
        let validator = SessionValidator::new(auth.clone());
        let err = validator
            .validate_at(&credential("u1", 60, Some("rt")), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptlabError::AuthExpired(_)));
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(auth.authentications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identity_mismatch_is_fatal() {
        let auth = Arc::new(CountingAuth::new("someone-else"));
        let validator = SessionValidator::new(auth.clone());
        let err = validator
            .validate_at(&credential("u1", 3600, None), NOW)
            .await
            .unwrap_err();
        assert!(matches!(err, PromptlabError::AuthMismatch { .. }));
        assert_eq!(auth.authentications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn custom_margin_is_respected() {
        let auth = Arc::new(CountingAuth::new("u1"));
        let validator =
            SessionValidator::new(auth.clone()).with_refresh_margin(Duration::from_secs(30));
        validator
            .validate_at(&credential("u1", 120, Some("rt")), NOW)
            .await
            .unwrap();
        assert_eq!(auth.refreshes.load(Ordering::SeqCst), 0);
    }
}
