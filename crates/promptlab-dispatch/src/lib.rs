// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test execution for Promptlab.
//!
//! A run moves through validation, session checks, a health gate, and one or
//! more provider invocations. Every invocation that reaches the provider is
//! persisted as exactly one [`TestResult`](promptlab_core::types::TestResult),
//! whether it completes, fails, times out or is superseded.

pub mod health;
mod invoke;
pub mod multi;
pub mod request;
pub mod scope;
pub mod single;
pub mod state;

use std::sync::Arc;

use promptlab_auth::SessionValidator;
use promptlab_config::model::TestDefaultsConfig;
use promptlab_core::{PromptlabError, ProviderAdapter, StorageAdapter};
use promptlab_core::types::PromptVersion;

pub use health::HealthGate;
pub use multi::{BatchMetadata, BatchOutcome, ModelFailure, MultiTestDispatcher};
pub use request::{BatchRequest, RunParams, TestRequest};
pub use scope::{CancelRegistry, ScopeTicket};
pub use single::{SingleTestDispatcher, SingleTestOutcome};
pub use state::{RunState, RunTracker};

/// Shared collaborators of both dispatchers.
#[derive(Clone)]
pub struct DispatchContext {
    pub provider: Arc<dyn ProviderAdapter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub validator: Arc<SessionValidator>,
    pub defaults: TestDefaultsConfig,
}

impl DispatchContext {
    pub fn health_gate(&self) -> HealthGate {
        HealthGate::new(self.storage.clone(), self.provider.clone())
    }

    /// The current version of `prompt_id`. Absence is a database-class failure.
    pub(crate) async fn current_version(
        &self,
        prompt_id: &str,
    ) -> Result<PromptVersion, PromptlabError> {
        self.storage
            .get_current_version(prompt_id)
            .await?
            .ok_or_else(|| PromptlabError::NotFound(format!("prompt `{prompt_id}` has no versions")))
    }
}

/// `{content}\n\nUser Input: {input}`.
pub fn assemble_prompt(content: &str, input: &str) -> String {
    format!("{content}\n\nUser Input: {input}")
}
