// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge queue store (`merge-queue.db`). Bookkeeping only; conflict
//! resolution happens elsewhere.

use crate::db::{self, StoreError};
use ovs_core::{MergeQueueEntry, MergeStatus};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct MergeQueueStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS merge_queue (
    branch_name TEXT PRIMARY KEY,
    bead_id TEXT NOT NULL DEFAULT '',
    agent_name TEXT NOT NULL,
    files_modified TEXT NOT NULL DEFAULT '[]',
    status TEXT NOT NULL DEFAULT 'pending',
    enqueued_at TEXT NOT NULL
);
";

impl MergeQueueStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open(path)?;
        conn.execute_batch(SCHEMA)?;
        db::add_column_if_missing(&conn, "merge_queue", "resolved_tier", "TEXT")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn enqueue(&self, e: &MergeQueueEntry) -> Result<(), StoreError> {
        let files = serde_json::to_string(&e.files_modified).unwrap_or_else(|_| "[]".to_string());
        self.conn.lock().execute(
            "INSERT INTO merge_queue (branch_name, bead_id, agent_name, files_modified,
                status, enqueued_at, resolved_tier)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(branch_name) DO UPDATE SET
                bead_id = excluded.bead_id,
                agent_name = excluded.agent_name,
                files_modified = excluded.files_modified,
                status = excluded.status,
                enqueued_at = excluded.enqueued_at,
                resolved_tier = excluded.resolved_tier",
            params![
                e.branch_name,
                e.bead_id,
                e.agent_name,
                files,
                e.status.as_str(),
                e.enqueued_at,
                e.resolved_tier,
            ],
        )?;
        Ok(())
    }

    pub fn pending(&self) -> Result<Vec<MergeQueueEntry>, StoreError> {
        self.query(&format!(
            "{} WHERE status = 'pending' ORDER BY enqueued_at",
            SELECT
        ))
    }

    pub fn all(&self) -> Result<Vec<MergeQueueEntry>, StoreError> {
        self.query(&format!("{} ORDER BY enqueued_at", SELECT))
    }

    pub fn update_status(
        &self,
        branch: &str,
        status: MergeStatus,
        resolved_tier: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE merge_queue SET status = ?2, resolved_tier = ?3 WHERE branch_name = ?1",
            params![branch, status.as_str(), resolved_tier],
        )?;
        Ok(())
    }

    pub fn purge_all(&self) -> Result<usize, StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM merge_queue", [])
            .map_err(Into::into)
    }

    fn query(&self, sql: &str) -> Result<Vec<MergeQueueEntry>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], row_to_entry)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}

const SELECT: &str = "SELECT branch_name, bead_id, agent_name, files_modified, status,
    enqueued_at, resolved_tier FROM merge_queue";

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<MergeQueueEntry> {
    let files: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(MergeQueueEntry {
        branch_name: row.get(0)?,
        bead_id: row.get(1)?,
        agent_name: row.get(2)?,
        files_modified: serde_json::from_str(&files).unwrap_or_default(),
        status: MergeStatus::from_str(&status).unwrap_or(MergeStatus::Pending),
        enqueued_at: row.get(5)?,
        resolved_tier: row.get(6)?,
    })
}

#[cfg(test)]
#[path = "merge_queue_tests.rs"]
mod tests;
