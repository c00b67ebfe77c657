// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication adapter trait for identity verification.

use async_trait::async_trait;

use crate::error::PromptlabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AuthIdentity, AuthToken, RefreshedToken};

/// Adapter for resolving bearer tokens to identities against the external issuer.
///
/// Token issuance lives outside Promptlab; adapters only verify and refresh.
#[async_trait]
pub trait AuthAdapter: PluginAdapter {
    /// Authenticates the given token and returns the verified identity.
    async fn authenticate(&self, token: &AuthToken) -> Result<AuthIdentity, PromptlabError>;

    /// Exchanges a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshedToken, PromptlabError>;
}
