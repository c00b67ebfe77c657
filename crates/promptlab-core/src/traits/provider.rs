// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for chat-completion model endpoints.

use async_trait::async_trait;

use crate::error::PromptlabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse};

/// Adapter for hosted language-model providers.
///
/// Implementations are pure with respect to local state: latency, token and
/// cost bookkeeping belong to the caller so every dispatch strategy can share
/// one client.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends one completion request and returns the full response.
    ///
    /// Fails with [`PromptlabError::Provider`] on non-success responses and
    /// [`PromptlabError::ProviderEmptyResponse`] when no choices come back.
    async fn complete(&self, request: ProviderRequest)
    -> Result<ProviderResponse, PromptlabError>;
}
