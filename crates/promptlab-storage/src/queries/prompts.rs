// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt version operations.

use promptlab_core::PromptlabError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::PromptVersion;

/// Insert a prompt version. `(prompt_id, version_number)` must be unique.
pub async fn save_prompt_version(db: &Database, version: &PromptVersion) -> Result<(), PromptlabError> {
    let version = version.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO prompt_versions
                     (version_id, prompt_id, version_number, title, content, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    version.version_id,
                    version.prompt_id,
                    version.version_number,
                    version.title,
                    version.content,
                    version.status,
                    version.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The highest-numbered version of a prompt, if any.
pub async fn get_current_version(
    db: &Database,
    prompt_id: &str,
) -> Result<Option<PromptVersion>, PromptlabError> {
    let prompt_id = prompt_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT version_id, prompt_id, version_number, title, content, status, created_at
                 FROM prompt_versions WHERE prompt_id = ?1
                 ORDER BY version_number DESC LIMIT 1",
            )?;
            let result = stmt.query_row(params![prompt_id], |row| {
                Ok(PromptVersion {
                    version_id: row.get(0)?,
                    prompt_id: row.get(1)?,
                    version_number: row.get(2)?,
                    title: row.get(3)?,
                    content: row.get(4)?,
                    status: row.get(5)?,
                    created_at: row.get(6)?,
                })
            });
            match result {
                Ok(version) => Ok(Some(version)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn version(prompt_id: &str, number: i64, content: &str) -> PromptVersion {
        PromptVersion {
            version_id: format!("{prompt_id}-v{number}"),
            prompt_id: prompt_id.to_string(),
            version_number: number,
            title: "Reviewer".to_string(),
            content: content.to_string(),
            status: "draft".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn current_version_is_highest_number() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap(), true)
            .await
            .unwrap();

        save_prompt_version(&db, &version("p1", 2, "second")).await.unwrap();
        save_prompt_version(&db, &version("p1", 1, "first")).await.unwrap();
        save_prompt_version(&db, &version("p2", 7, "other")).await.unwrap();

        let current = get_current_version(&db, "p1").await.unwrap().unwrap();
        assert_eq!(current.version_number, 2);
        assert_eq!(current.content, "second");
    }

    #[tokio::test]
    async fn missing_prompt_returns_none() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap(), true)
            .await
            .unwrap();
        assert!(get_current_version(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_version_number_rejected() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("p.db").to_str().unwrap(), true)
            .await
            .unwrap();
        save_prompt_version(&db, &version("p1", 1, "a")).await.unwrap();
        let mut dup = version("p1", 1, "b");
        dup.version_id = "other-id".to_string();
        assert!(save_prompt_version(&db, &dup).await.is_err());
    }
}
