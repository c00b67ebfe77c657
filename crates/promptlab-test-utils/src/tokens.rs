// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unsigned bearer tokens for tests.

use promptlab_auth::encode_unsigned;
use promptlab_core::types::{AuthToken, Claims, Credential};

/// Refresh token handed out for `sub`. [`MockAuth`](crate::MockAuth) maps it back.
pub fn refresh_token_for(sub: &str) -> String {
    format!("refresh-{sub}")
}

/// Builds a token whose expiry is relative to the wall clock.
#[derive(Debug, Clone)]
pub struct TokenBuilder {
    sub: String,
    expires_in: i64,
    refresh_token: Option<String>,
}

impl TokenBuilder {
    /// One hour of validity and a matching refresh token.
    pub fn new(sub: &str) -> Self {
        Self {
            sub: sub.to_string(),
            expires_in: 3600,
            refresh_token: Some(refresh_token_for(sub)),
        }
    }

    /// Negative values produce an already-expired token.
    pub fn expires_in_secs(mut self, secs: i64) -> Self {
        self.expires_in = secs;
        self
    }

    pub fn without_refresh_token(mut self) -> Self {
        self.refresh_token = None;
        self
    }

    pub fn with_refresh_token(mut self, token: &str) -> Self {
        self.refresh_token = Some(token.to_string());
        self
    }

    pub fn claims(&self) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: self.sub.clone(),
            iat: now,
            exp: now + self.expires_in,
        }
    }

    pub fn token(&self) -> AuthToken {
        encode_unsigned(&self.claims())
    }

    pub fn credential(&self) -> Credential {
        let claims = self.claims();
        Credential {
            token: encode_unsigned(&claims),
            claims,
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token().as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}
