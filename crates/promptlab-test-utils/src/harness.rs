// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the dispatch and scoring stack over mock adapters
//! and a temp SQLite database.

use std::sync::Arc;
use std::time::Duration;

use promptlab_auth::SessionValidator;
use promptlab_config::model::PromptlabConfig;
use promptlab_core::types::{Credential, PromptVersion};
use promptlab_core::{PromptlabError, StorageAdapter};
use promptlab_dispatch::{DispatchContext, MultiTestDispatcher, SingleTestDispatcher};
use promptlab_scoring::{AiAnalyzer, ScoreResolver, TechniqueEngine};
use promptlab_storage::SqliteStorage;

use crate::fixtures::{seed_prompt, test_storage_config};
use crate::mock_auth::MockAuth;
use crate::mock_provider::MockProvider;
use crate::tokens::TokenBuilder;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    provider: MockProvider,
    auth: MockAuth,
    config: PromptlabConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            provider: MockProvider::new(),
            auth: MockAuth::new(),
            config: PromptlabConfig::default(),
        }
    }

    pub fn with_provider(mut self, provider: MockProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_auth(mut self, auth: MockAuth) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_single_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider.single_timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_batch_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider.batch_timeout_secs = timeout.as_secs();
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, PromptlabError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PromptlabError::Storage { source: e.into() })?;
        let mut config = self.config;
        config.storage = test_storage_config(temp_dir.path());

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let provider = Arc::new(self.provider);
        let auth = Arc::new(self.auth);
        let validator = Arc::new(
            SessionValidator::new(auth.clone())
                .with_refresh_margin(Duration::from_secs(config.auth.refresh_margin_secs)),
        );
        let ctx = DispatchContext {
            provider: provider.clone(),
            storage: storage.clone(),
            validator: validator.clone(),
            defaults: config.defaults.clone(),
        };

        let single = Arc::new(
            SingleTestDispatcher::new(ctx.clone())
                .with_timeout(Duration::from_secs(config.provider.single_timeout_secs)),
        );
        let multi = Arc::new(
            MultiTestDispatcher::new(ctx)
                .with_timeout(Duration::from_secs(config.provider.batch_timeout_secs)),
        );
        let resolver = Arc::new(ScoreResolver::new(storage.clone(), TechniqueEngine::new()));
        let analyzer = Arc::new(AiAnalyzer::new(
            provider.clone(),
            storage.clone(),
            &config.analysis.model,
            config.analysis.max_tokens,
        )?);

        Ok(TestHarness {
            provider,
            auth,
            storage,
            validator,
            single,
            multi,
            resolver,
            analyzer,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub auth: Arc<MockAuth>,
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    pub validator: Arc<SessionValidator>,
    pub single: Arc<SingleTestDispatcher>,
    pub multi: Arc<MultiTestDispatcher>,
    pub resolver: Arc<ScoreResolver>,
    pub analyzer: Arc<AiAnalyzer>,
    pub config: PromptlabConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn storage_dyn(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }

    /// Save `content` as the next version of `prompt_id`.
    pub async fn seed_prompt(
        &self,
        prompt_id: &str,
        content: &str,
    ) -> Result<PromptVersion, PromptlabError> {
        seed_prompt(self.storage.as_ref(), prompt_id, content).await
    }

    /// A one-hour credential for `sub`.
    pub fn credential(&self, sub: &str) -> Credential {
        TokenBuilder::new(sub).credential()
    }
}
