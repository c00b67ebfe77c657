// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test result operations. Rows are inserted once and never updated.

use std::str::FromStr;

use promptlab_core::PromptlabError;
use rusqlite::{Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::{TestResult, TestStatus, TokenUsage, conversion_error, from_sql_u64, to_sql_i64};

const SELECT_COLUMNS: &str = "SELECT id, prompt_id, prompt_version_id, user_id, input_text, output_text,
        model, temperature, max_tokens, response_time_ms, cost_estimate,
        prompt_tokens, completion_tokens, total_tokens, status, error_message,
        batch_id, created_at
 FROM test_results";

// Ties on created_at (same millisecond) fall back to insertion order.
const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

fn row_to_result(row: &Row<'_>) -> Result<TestResult, rusqlite::Error> {
    let status: String = row.get(14)?;
    let status = TestStatus::from_str(&status).map_err(|e| conversion_error(14, e))?;
    Ok(TestResult {
        id: row.get(0)?,
        prompt_id: row.get(1)?,
        prompt_version_id: row.get(2)?,
        user_id: row.get(3)?,
        input_text: row.get(4)?,
        output_text: row.get(5)?,
        model: row.get(6)?,
        temperature: row.get(7)?,
        max_tokens: row.get(8)?,
        response_time_ms: from_sql_u64(row.get(9)?),
        cost_estimate: row.get(10)?,
        token_usage: TokenUsage {
            prompt_tokens: row.get(11)?,
            completion_tokens: row.get(12)?,
            total_tokens: row.get(13)?,
        },
        status,
        error_message: row.get(15)?,
        batch_id: row.get(16)?,
        created_at: row.get(17)?,
    })
}

/// Append one test result.
pub async fn insert_test_result(db: &Database, result: &TestResult) -> Result<(), PromptlabError> {
    let r = result.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO test_results
                     (id, prompt_id, prompt_version_id, user_id, input_text, output_text,
                      model, temperature, max_tokens, response_time_ms, cost_estimate,
                      prompt_tokens, completion_tokens, total_tokens, status, error_message,
                      batch_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    r.id,
                    r.prompt_id,
                    r.prompt_version_id,
                    r.user_id,
                    r.input_text,
                    r.output_text,
                    r.model,
                    r.temperature,
                    r.max_tokens,
                    to_sql_i64(r.response_time_ms),
                    r.cost_estimate,
                    r.token_usage.prompt_tokens,
                    r.token_usage.completion_tokens,
                    r.token_usage.total_tokens,
                    r.status.to_string(),
                    r.error_message,
                    r.batch_id,
                    r.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Results for a prompt, newest first, optionally limited.
pub async fn list_for_prompt(
    db: &Database,
    prompt_id: &str,
    limit: Option<i64>,
) -> Result<Vec<TestResult>, PromptlabError> {
    let prompt_id = prompt_id.to_string();
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.unwrap_or(-1);
    db.connection()
        .call(move |conn| {
            let sql = format!("{SELECT_COLUMNS} WHERE prompt_id = ?1 {NEWEST_FIRST} LIMIT ?2");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![prompt_id, limit], row_to_result)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Every result of one batch, newest first.
pub async fn list_for_batch(db: &Database, batch_id: &str) -> Result<Vec<TestResult>, PromptlabError> {
    let batch_id = batch_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("{SELECT_COLUMNS} WHERE batch_id = ?1 {NEWEST_FIRST}");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![batch_id], row_to_result)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Results recorded against one prompt version, newest first.
pub async fn list_for_version(
    db: &Database,
    prompt_version_id: &str,
) -> Result<Vec<TestResult>, PromptlabError> {
    let version_id = prompt_version_id.to_string();
    db.connection()
        .call(move |conn| {
            let sql = format!("{SELECT_COLUMNS} WHERE prompt_version_id = ?1 {NEWEST_FIRST}");
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![version_id], row_to_result)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlab_core::types::InvocationContext;
    use tempfile::tempdir;

    fn ctx(model: &str, batch: Option<&str>) -> InvocationContext {
        InvocationContext {
            prompt_id: "p1".into(),
            prompt_version_id: "p1-v1".into(),
            user_id: "user-1".into(),
            input_text: "hello".into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: 1000,
            batch_id: batch.map(str::to_string),
        }
    }

    async fn open() -> (tempfile::TempDir, Database) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("r.db").to_str().unwrap(), true)
            .await
            .unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn completed_and_failed_rows_round_trip() {
        let (_dir, db) = open().await;
        let ok = TestResult::completed(
            &ctx("gpt-4o", Some("b1")),
            "output".into(),
            TokenUsage::new(10, 5),
            0.000075,
            420,
        );
        let failed = TestResult::failed(&ctx("gpt-4o-mini", Some("b1")), "boom".into(), 17);
        insert_test_result(&db, &ok).await.unwrap();
        insert_test_result(&db, &failed).await.unwrap();

        let rows = list_for_batch(&db, "b1").await.unwrap();
        assert_eq!(rows.len(), 2);
        let stored_ok = rows.iter().find(|r| r.id == ok.id).unwrap();
        assert_eq!(stored_ok, &ok);
        let stored_failed = rows.iter().find(|r| r.id == failed.id).unwrap();
        assert_eq!(stored_failed.status, TestStatus::Failed);
        assert_eq!(stored_failed.output_text, None);
        assert_eq!(stored_failed.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn list_for_prompt_is_newest_first_and_limited() {
        let (_dir, db) = open().await;
        let mut ids = Vec::new();
        for i in 0..3 {
            let mut r = TestResult::completed(
                &ctx("gpt-4o", None),
                format!("out {i}"),
                TokenUsage::new(1, 1),
                0.0,
                1,
            );
            r.created_at = format!("2026-01-01T00:00:0{i}.000Z");
            ids.push(r.id.clone());
            insert_test_result(&db, &r).await.unwrap();
        }

        let all = list_for_prompt(&db, "p1", None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, ids[2]);
        assert_eq!(all[2].id, ids[0]);

        let limited = list_for_prompt(&db, "p1", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, ids[2]);
    }

    #[tokio::test]
    async fn list_for_version_filters() {
        let (_dir, db) = open().await;
        let r = TestResult::failed(&ctx("gpt-4o", None), "x".into(), 1);
        insert_test_result(&db, &r).await.unwrap();
        assert_eq!(list_for_version(&db, "p1-v1").await.unwrap().len(), 1);
        assert!(list_for_version(&db, "p1-v2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rows_cannot_be_updated() {
        let (_dir, db) = open().await;
        let r = TestResult::failed(&ctx("gpt-4o", None), "x".into(), 1);
        insert_test_result(&db, &r).await.unwrap();

        let outcome = db
            .connection()
            .call(|conn| conn.execute("UPDATE test_results SET model = 'other'", []))
            .await
            .map_err(map_tr_err);
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn rows_cannot_be_deleted() {
        let (_dir, db) = open().await;
        let r = TestResult::failed(&ctx("gpt-4o", None), "x".into(), 1);
        insert_test_result(&db, &r).await.unwrap();

        let outcome = db
            .connection()
            .call(|conn| conn.execute("DELETE FROM test_results", []))
            .await
            .map_err(map_tr_err);
        assert!(outcome.is_err());
        assert_eq!(list_for_version(&db, "p1-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inconsistent_status_rejected_by_schema() {
        let (_dir, db) = open().await;
        let mut r = TestResult::failed(&ctx("gpt-4o", None), "x".into(), 1);
        r.output_text = Some("should not be here".into());
        assert!(insert_test_result(&db, &r).await.is_err());
    }
}
