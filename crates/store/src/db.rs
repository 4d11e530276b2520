// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared connection setup and schema-migration helpers.

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Writer busy-retry window shared by all stores.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a database with the shared concurrency configuration:
/// WAL journal mode (readers don't block the writer) and a 5-second
/// busy-wait retry for contending writers.
pub(crate) fn open(path: &Path) -> Result<Connection, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

/// Additive column migration: add `column` to `table` when absent.
///
/// New columns must declare a DEFAULT (zero or null) so existing rows stay
/// readable. Errors other than "column missing" propagate.
pub(crate) fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let existing: Vec<String> = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<_, _>>()?;
    if existing.iter().any(|c| c == column) {
        return Ok(());
    }
    conn.execute(
        &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl),
        [],
    )?;
    tracing::debug!(table, column, "added column");
    Ok(())
}

/// Best-effort WAL checkpoint before shutdown.
pub(crate) fn checkpoint(conn: &Connection) {
    // wal_checkpoint returns a (busy, log, checkpointed) row; discard it.
    if let Err(e) = conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(())) {
        tracing::debug!(error = %e, "wal checkpoint failed");
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
