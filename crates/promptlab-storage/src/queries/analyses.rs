// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis record operations.

use std::str::FromStr;

use promptlab_core::PromptlabError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{AnalysisPayload, AnalysisRecord, AnalysisType, conversion_error};

/// Append one analysis record. The payload is stored as JSON.
pub async fn insert_analysis(db: &Database, record: &AnalysisRecord) -> Result<(), PromptlabError> {
    let payload = serde_json::to_string(&record.result).map_err(|e| PromptlabError::Storage {
        source: Box::new(e),
    })?;
    let record = record.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO analysis_records
                     (id, prompt_id, content_hash, analysis_type, result, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.id,
                    record.prompt_id,
                    record.content_hash,
                    record.analysis_type.to_string(),
                    payload,
                    record.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All analysis records of a prompt, newest first.
pub async fn list_analyses(
    db: &Database,
    prompt_id: &str,
) -> Result<Vec<AnalysisRecord>, PromptlabError> {
    let prompt_id = prompt_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, prompt_id, content_hash, analysis_type, result, created_at
                 FROM analysis_records WHERE prompt_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt.query_map(params![prompt_id], |row| {
                let analysis_type: String = row.get(3)?;
                let analysis_type =
                    AnalysisType::from_str(&analysis_type).map_err(|e| conversion_error(3, e))?;
                let payload: String = row.get(4)?;
                let result: AnalysisPayload =
                    serde_json::from_str(&payload).map_err(|e| conversion_error(4, e))?;
                Ok(AnalysisRecord {
                    id: row.get(0)?,
                    prompt_id: row.get(1)?,
                    content_hash: row.get(2)?,
                    analysis_type,
                    result,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
