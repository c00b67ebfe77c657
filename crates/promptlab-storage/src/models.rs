// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `promptlab-core::types` so they can cross
//! adapter trait boundaries; this module re-exports them for the query modules.

pub use promptlab_core::types::{
    AnalysisPayload, AnalysisRecord, AnalysisType, PromptVersion, TestResult, TestStatus,
    TokenUsage,
};

/// Wraps a column decoding failure so it surfaces as a rusqlite error.
pub(crate) fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

/// SQLite stores signed 64-bit integers; saturate rather than wrap.
pub(crate) fn to_sql_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

pub(crate) fn from_sql_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
