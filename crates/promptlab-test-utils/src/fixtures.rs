// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage fixtures.

use std::path::Path;

use promptlab_config::model::StorageConfig;
use promptlab_core::types::{PromptVersion, now_timestamp};
use promptlab_core::{PromptlabError, StorageAdapter};

/// Storage config for a database file inside `dir`.
pub fn test_storage_config(dir: &Path) -> StorageConfig {
    StorageConfig {
        database_path: dir.join("promptlab.db").to_string_lossy().into_owned(),
        wal_mode: true,
    }
}

/// Save `content` as the next version of `prompt_id`.
pub async fn seed_prompt(
    storage: &dyn StorageAdapter,
    prompt_id: &str,
    content: &str,
) -> Result<PromptVersion, PromptlabError> {
    let next = storage
        .get_current_version(prompt_id)
        .await?
        .map_or(1, |v| v.version_number + 1);
    let version = PromptVersion {
        version_id: uuid::Uuid::new_v4().to_string(),
        prompt_id: prompt_id.to_string(),
        version_number: next,
        title: format!("{prompt_id} v{next}"),
        content: content.to_string(),
        status: "draft".to_string(),
        created_at: now_timestamp(),
    };
    storage.save_prompt_version(&version).await?;
    Ok(version)
}
