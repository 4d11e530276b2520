// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics store (`metrics.db`): session totals keyed (agent, bead) plus an
//! append-only token-snapshot history that feeds the live cost dashboard.

use crate::db::{self, StoreError};
use ovs_core::{SessionMetrics, TokenSnapshot, TokenTotals};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct MetricsStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS session_metrics (
    agent_name TEXT NOT NULL,
    bead_id TEXT NOT NULL DEFAULT '',
    input_tokens INTEGER NOT NULL DEFAULT 0,
    output_tokens INTEGER NOT NULL DEFAULT 0,
    cache_read_tokens INTEGER NOT NULL DEFAULT 0,
    cache_creation_tokens INTEGER NOT NULL DEFAULT 0,
    duration_ms INTEGER,
    merge_result TEXT,
    parent_agent TEXT,
    run_id TEXT,
    PRIMARY KEY (agent_name, bead_id)
);
CREATE TABLE IF NOT EXISTS token_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_name TEXT NOT NULL,
    input_tokens INTEGER NOT NULL DEFAULT 0,
    output_tokens INTEGER NOT NULL DEFAULT 0,
    cache_read_tokens INTEGER NOT NULL DEFAULT 0,
    cache_creation_tokens INTEGER NOT NULL DEFAULT 0,
    model_used TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_snapshots_agent ON token_snapshots(agent_name);
";

impl MetricsStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open(path)?;
        conn.execute_batch(SCHEMA)?;
        // Cost estimation and model tracking arrived after the first release
        db::add_column_if_missing(&conn, "session_metrics", "estimated_cost_usd", "REAL")?;
        db::add_column_if_missing(&conn, "session_metrics", "model_used", "TEXT")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert-or-replace keyed on (agent_name, bead_id).
    pub fn upsert(&self, m: &SessionMetrics) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO session_metrics (agent_name, bead_id, input_tokens, output_tokens,
                cache_read_tokens, cache_creation_tokens, duration_ms, merge_result,
                parent_agent, run_id, estimated_cost_usd, model_used)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(agent_name, bead_id) DO UPDATE SET
                input_tokens = excluded.input_tokens,
                output_tokens = excluded.output_tokens,
                cache_read_tokens = excluded.cache_read_tokens,
                cache_creation_tokens = excluded.cache_creation_tokens,
                duration_ms = excluded.duration_ms,
                merge_result = excluded.merge_result,
                parent_agent = excluded.parent_agent,
                run_id = excluded.run_id,
                estimated_cost_usd = excluded.estimated_cost_usd,
                model_used = excluded.model_used",
            params![
                m.agent_name,
                m.bead_id,
                m.tokens.input_tokens,
                m.tokens.output_tokens,
                m.tokens.cache_read_tokens,
                m.tokens.cache_creation_tokens,
                m.duration_ms,
                m.merge_result,
                m.parent_agent,
                m.run_id,
                m.estimated_cost_usd,
                m.model_used,
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, agent: &str, bead_id: &str) -> Result<Option<SessionMetrics>, StoreError> {
        self.conn
            .lock()
            .query_row(
                "SELECT agent_name, bead_id, input_tokens, output_tokens, cache_read_tokens,
                    cache_creation_tokens, duration_ms, merge_result, parent_agent, run_id,
                    estimated_cost_usd, model_used
                 FROM session_metrics WHERE agent_name = ?1 AND bead_id = ?2",
                params![agent, bead_id],
                row_to_metrics,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Append a usage observation. History is retained.
    pub fn record_snapshot(&self, s: &TokenSnapshot) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO token_snapshots (agent_name, input_tokens, output_tokens,
                cache_read_tokens, cache_creation_tokens, model_used, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                s.agent_name,
                s.tokens.input_tokens,
                s.tokens.output_tokens,
                s.tokens.cache_read_tokens,
                s.tokens.cache_creation_tokens,
                s.model_used,
                s.created_at,
            ],
        )?;
        Ok(())
    }

    /// Newest snapshot per agent.
    pub fn latest_snapshots(&self) -> Result<Vec<TokenSnapshot>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT agent_name, input_tokens, output_tokens, cache_read_tokens,
                cache_creation_tokens, model_used, created_at
             FROM token_snapshots
             WHERE id IN (SELECT MAX(id) FROM token_snapshots GROUP BY agent_name)
             ORDER BY agent_name",
        )?;
        let rows = stmt.query_map([], row_to_snapshot)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn purge_all(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let a = conn.execute("DELETE FROM session_metrics", [])?;
        let b = conn.execute("DELETE FROM token_snapshots", [])?;
        Ok(a + b)
    }
}

fn row_to_metrics(row: &Row<'_>) -> rusqlite::Result<SessionMetrics> {
    Ok(SessionMetrics {
        agent_name: row.get(0)?,
        bead_id: row.get(1)?,
        tokens: TokenTotals {
            input_tokens: row.get(2)?,
            output_tokens: row.get(3)?,
            cache_read_tokens: row.get(4)?,
            cache_creation_tokens: row.get(5)?,
        },
        duration_ms: row.get(6)?,
        merge_result: row.get(7)?,
        parent_agent: row.get(8)?,
        run_id: row.get(9)?,
        estimated_cost_usd: row.get(10)?,
        model_used: row.get(11)?,
    })
}

fn row_to_snapshot(row: &Row<'_>) -> rusqlite::Result<TokenSnapshot> {
    Ok(TokenSnapshot {
        agent_name: row.get(0)?,
        tokens: TokenTotals {
            input_tokens: row.get(1)?,
            output_tokens: row.get(2)?,
            cache_read_tokens: row.get(3)?,
            cache_creation_tokens: row.get(4)?,
        },
        model_used: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
