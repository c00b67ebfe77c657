// SPDX-FileCopyrightText: 2026 Promptlab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode and lifecycle.
//!
//! All reads and writes are serialized through tokio-rusqlite's single
//! background thread. Do not create additional connections for writes.

use std::path::Path;

use promptlab_core::PromptlabError;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into `PromptlabError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PromptlabError {
    PromptlabError::Storage {
        source: Box::new(e),
    }
}

fn map_sqlite_err(e: rusqlite::Error) -> PromptlabError {
    PromptlabError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the single SQLite connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path`, apply pragmas and run migrations.
    ///
    /// Schema setup runs on a short-lived synchronous connection before the
    /// long-lived async connection is opened.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, PromptlabError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PromptlabError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), PromptlabError> {
            let mut conn = rusqlite::Connection::open(&setup_path).map_err(map_sqlite_err)?;
            apply_pragmas(&conn, wal_mode).map_err(map_sqlite_err)?;
            migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| PromptlabError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PromptlabError::Storage {
                source: Box::new(e),
            })?;

        conn.call(move |conn| apply_pragmas(conn, wal_mode))
            .await
            .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The async connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Round-trip a trivial statement through the writer thread.
    pub async fn ping(&self) -> Result<(), PromptlabError> {
        self.conn
            .call(|conn| conn.execute_batch("SELECT 1;"))
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and truncate the WAL.
    pub async fn checkpoint(&self) -> Result<(), PromptlabError> {
        self.conn
            .call(|conn| conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);"))
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        // journal_mode returns a row, so it cannot go through execute_batch.
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    }
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
}
