// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use promptlab_config::model::StorageConfig;
use promptlab_core::types::{AnalysisRecord, PromptVersion, TestResult};
use promptlab_core::{AdapterType, HealthStatus, PluginAdapter, PromptlabError, StorageAdapter};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. No connection is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, PromptlabError> {
        self.db
            .get()
            .ok_or_else(|| PromptlabError::storage("storage not initialized; call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PromptlabError> {
        self.db()?.ping().await?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PromptlabError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PromptlabError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| PromptlabError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), PromptlabError> {
        self.db()?.checkpoint().await
    }

    async fn save_prompt_version(&self, version: &PromptVersion) -> Result<(), PromptlabError> {
        queries::prompts::save_prompt_version(self.db()?, version).await
    }

    async fn get_current_version(
        &self,
        prompt_id: &str,
    ) -> Result<Option<PromptVersion>, PromptlabError> {
        queries::prompts::get_current_version(self.db()?, prompt_id).await
    }

    async fn insert_test_result(&self, result: &TestResult) -> Result<(), PromptlabError> {
        queries::test_results::insert_test_result(self.db()?, result).await
    }

    async fn list_results_for_prompt(
        &self,
        prompt_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<TestResult>, PromptlabError> {
        queries::test_results::list_for_prompt(self.db()?, prompt_id, limit).await
    }

    async fn list_results_for_batch(&self, batch_id: &str) -> Result<Vec<TestResult>, PromptlabError> {
        queries::test_results::list_for_batch(self.db()?, batch_id).await
    }

    async fn list_results_for_version(
        &self,
        prompt_version_id: &str,
    ) -> Result<Vec<TestResult>, PromptlabError> {
        queries::test_results::list_for_version(self.db()?, prompt_version_id).await
    }

    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<(), PromptlabError> {
        queries::analyses::insert_analysis(self.db()?, record).await
    }

    async fn list_analyses(&self, prompt_id: &str) -> Result<Vec<AnalysisRecord>, PromptlabError> {
        queries::analyses::list_analyses(self.db()?, prompt_id).await
    }
}
