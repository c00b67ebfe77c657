// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-flight check against the execution backend.

use std::sync::Arc;

use promptlab_core::types::HealthStatus;
use promptlab_core::{PluginAdapter, PromptlabError, ProviderAdapter, StorageAdapter};
use tracing::{debug, warn};

/// Fails fast when the store or the provider cannot accept work.
///
/// Runs once per dispatch. Never retried.
#[derive(Clone)]
pub struct HealthGate {
    storage: Arc<dyn StorageAdapter>,
    provider: Arc<dyn ProviderAdapter>,
}

impl HealthGate {
    pub fn new(storage: Arc<dyn StorageAdapter>, provider: Arc<dyn ProviderAdapter>) -> Self {
        Self { storage, provider }
    }

    pub async fn check(&self) -> Result<(), PromptlabError> {
        check_adapter(self.storage.as_ref()).await?;
        check_adapter(self.provider.as_ref()).await?;
        debug!("health gate passed");
        Ok(())
    }
}

async fn check_adapter(adapter: &(impl PluginAdapter + ?Sized)) -> Result<(), PromptlabError> {
    let name = adapter.name().to_string();
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => Ok(()),
        Ok(HealthStatus::Degraded(reason)) => {
            warn!(adapter = %name, reason = %reason, "adapter degraded, continuing");
            Ok(())
        }
        Ok(HealthStatus::Unhealthy(reason)) => Err(PromptlabError::ServiceUnavailable(format!(
            "{name} is unhealthy: {reason}"
        ))),
        Err(e) => Err(PromptlabError::ServiceUnavailable(format!(
            "{name} health check failed: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_core::ErrorType;
    use promptlab_storage::SqliteStorage;
    use promptlab_test_utils::{MockProvider, test_storage_config};
    use tempfile::TempDir;

    async fn ready_storage(dir: &TempDir) -> Arc<SqliteStorage> {
        let storage = SqliteStorage::new(test_storage_config(dir.path()));
        storage.initialize().await.unwrap();
        Arc::new(storage)
    }

    #[tokio::test]
    async fn healthy_backend_passes() {
        let dir = TempDir::new().unwrap();
        let gate = HealthGate::new(ready_storage(&dir).await, Arc::new(MockProvider::new()));
        gate.check().await.unwrap();
    }

    #[tokio::test]
    async fn uninitialized_storage_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(SqliteStorage::new(test_storage_config(dir.path())));
        let gate = HealthGate::new(storage, Arc::new(MockProvider::new()));
        let err = gate.check().await.unwrap_err();
        assert!(matches!(err, PromptlabError::ServiceUnavailable(_)));
        assert_eq!(err.error_type(), ErrorType::Api);
    }

    #[tokio::test]
    async fn unhealthy_provider_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new().unhealthy("maintenance"));
        let gate = HealthGate::new(ready_storage(&dir).await, provider.clone());
        let err = gate.check().await.unwrap_err();
        assert!(err.to_string().contains("maintenance"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn degraded_provider_still_passes() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new().degraded("slow upstream"));
        let gate = HealthGate::new(ready_storage(&dir).await, provider);
        gate.check().await.unwrap();
    }
}
