// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the prompt and result store.

use async_trait::async_trait;

use crate::error::PromptlabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AnalysisRecord, PromptVersion, TestResult};

/// Adapter for the keyed record store.
///
/// Test results and analysis records are append-only: there is no update or
/// delete operation for either.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), PromptlabError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), PromptlabError>;

    // --- Prompt versions ---

    /// Stores a prompt version.
    async fn save_prompt_version(&self, version: &PromptVersion) -> Result<(), PromptlabError>;

    /// Returns the current (highest-numbered) version of a prompt.
    async fn get_current_version(
        &self,
        prompt_id: &str,
    ) -> Result<Option<PromptVersion>, PromptlabError>;

    // --- Test results ---

    /// Appends one test result.
    async fn insert_test_result(&self, result: &TestResult) -> Result<(), PromptlabError>;

    /// Lists test results for a prompt, newest first.
    async fn list_results_for_prompt(
        &self,
        prompt_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<TestResult>, PromptlabError>;

    /// Lists every test result sharing a batch id.
    async fn list_results_for_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<TestResult>, PromptlabError>;

    /// Lists test results recorded against one prompt version, newest first.
    async fn list_results_for_version(
        &self,
        prompt_version_id: &str,
    ) -> Result<Vec<TestResult>, PromptlabError>;

    // --- Analysis records ---

    /// Appends one analysis record.
    async fn insert_analysis(&self, record: &AnalysisRecord) -> Result<(), PromptlabError>;

    /// Lists analysis records for a prompt, newest first.
    async fn list_analyses(&self, prompt_id: &str)
    -> Result<Vec<AnalysisRecord>, PromptlabError>;
}
