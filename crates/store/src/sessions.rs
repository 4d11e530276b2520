// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session registry and run registry (`sessions.db`).
//!
//! The registry exclusively owns all session rows. Every read-then-write is
//! a single SQL statement so concurrent agent processes cannot lose updates.
//!
//! On the first open of a fresh database, entries from the legacy JSON
//! registry (`sessions.json`) are imported. Once the database file exists
//! the JSON file is ignored forever, which makes the migration one-shot.

use crate::db::{self, StoreError};
use ovs_core::{AgentSession, Capability, Run, RunStatus, SessionState};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// What to delete in a purge.
#[derive(Debug, Clone)]
pub enum PurgeFilter {
    All,
    State(SessionState),
    Agent(String),
}

#[derive(Clone)]
pub struct SessionStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT NOT NULL,
    agent_name TEXT NOT NULL UNIQUE,
    capability TEXT NOT NULL,
    worktree_path TEXT NOT NULL,
    branch_name TEXT NOT NULL,
    bead_id TEXT NOT NULL DEFAULT '',
    tmux_session TEXT NOT NULL,
    state TEXT NOT NULL CHECK (state IN ('booting','working','stalled','completed','zombie')),
    pid INTEGER,
    parent_agent TEXT,
    depth INTEGER NOT NULL DEFAULT 0,
    run_id TEXT,
    started_at TEXT NOT NULL,
    last_activity TEXT NOT NULL,
    stalled_since TEXT
);
CREATE INDEX IF NOT EXISTS idx_sessions_state ON sessions(state);
CREATE INDEX IF NOT EXISTS idx_sessions_run ON sessions(run_id);
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    agent_count INTEGER NOT NULL DEFAULT 0,
    coordinator_session_id TEXT,
    status TEXT NOT NULL DEFAULT 'active'
);
";

impl SessionStore {
    /// Open the registry, creating the schema when needed.
    ///
    /// Returns the store and a `migrated` flag: `true` when entries were
    /// imported from the legacy JSON registry during this open.
    pub fn open(db_path: &Path, legacy_json: &Path) -> Result<(Self, bool), StoreError> {
        let fresh_db = !db_path.exists();
        let conn = db::open(db_path)?;
        conn.execute_batch(SCHEMA)?;
        // escalation_level arrived after the first release
        db::add_column_if_missing(&conn, "sessions", "escalation_level", "INTEGER NOT NULL DEFAULT 0")?;

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        let migrated = if fresh_db {
            store.import_legacy(legacy_json)?
        } else {
            false
        };

        Ok((store, migrated))
    }

    /// Import the legacy JSON registry. Malformed or non-array content is
    /// tolerated by importing nothing.
    fn import_legacy(&self, legacy_json: &Path) -> Result<bool, StoreError> {
        if !legacy_json.exists() {
            return Ok(false);
        }
        let content = match std::fs::read_to_string(legacy_json) {
            Ok(c) => c,
            Err(_) => return Ok(false),
        };
        let entries: Vec<AgentSession> = match serde_json::from_str::<serde_json::Value>(&content)
        {
            Ok(serde_json::Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        };

        let count = entries.len();
        for session in entries {
            self.upsert(&session)?;
        }
        tracing::info!(count, "imported legacy session registry");
        Ok(true)
    }

    /// Insert-or-replace keyed on `agent_name`. All fields replace on
    /// conflict.
    pub fn upsert(&self, s: &AgentSession) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO sessions (id, agent_name, capability, worktree_path, branch_name,
                bead_id, tmux_session, state, pid, parent_agent, depth, run_id,
                started_at, last_activity, stalled_since, escalation_level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(agent_name) DO UPDATE SET
                id = excluded.id,
                capability = excluded.capability,
                worktree_path = excluded.worktree_path,
                branch_name = excluded.branch_name,
                bead_id = excluded.bead_id,
                tmux_session = excluded.tmux_session,
                state = excluded.state,
                pid = excluded.pid,
                parent_agent = excluded.parent_agent,
                depth = excluded.depth,
                run_id = excluded.run_id,
                started_at = excluded.started_at,
                last_activity = excluded.last_activity,
                stalled_since = excluded.stalled_since,
                escalation_level = excluded.escalation_level",
            params![
                s.id,
                s.agent_name,
                s.capability.as_str(),
                s.worktree_path,
                s.branch_name,
                s.bead_id,
                s.tmux_session,
                s.state.as_str(),
                s.pid,
                s.parent_agent,
                s.depth,
                s.run_id,
                s.started_at,
                s.last_activity,
                s.stalled_since,
                s.escalation_level,
            ],
        )?;
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<AgentSession>, StoreError> {
        self.conn
            .lock()
            .query_row(
                &format!("{} WHERE agent_name = ?1", SELECT_SESSION),
                params![name],
                row_to_session,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_all(&self) -> Result<Vec<AgentSession>, StoreError> {
        self.query_sessions(&format!("{} ORDER BY started_at", SELECT_SESSION), &[])
    }

    /// Sessions in a live state, ordered by start time.
    pub fn get_active(&self) -> Result<Vec<AgentSession>, StoreError> {
        self.query_sessions(
            &format!(
                "{} WHERE state IN ('booting','working','stalled') ORDER BY started_at",
                SELECT_SESSION
            ),
            &[],
        )
    }

    pub fn get_by_run(&self, run_id: &str) -> Result<Vec<AgentSession>, StoreError> {
        self.query_sessions(
            &format!("{} WHERE run_id = ?1 ORDER BY started_at", SELECT_SESSION),
            &[run_id],
        )
    }

    pub fn update_state(&self, name: &str, state: SessionState) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE sessions SET state = ?2 WHERE agent_name = ?1",
            params![name, state.as_str()],
        )?;
        Ok(())
    }

    /// Record activity now. Does not change state; see [`mark_active`].
    ///
    /// [`mark_active`]: SessionStore::mark_active
    pub fn update_last_activity(&self, name: &str, now: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE sessions SET last_activity = ?2 WHERE agent_name = ?1",
            params![name, now],
        )?;
        Ok(())
    }

    /// First-activity transition: booting becomes working, in one statement.
    pub fn mark_active(&self, name: &str, now: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE sessions SET last_activity = ?2,
                state = CASE WHEN state = 'booting' THEN 'working' ELSE state END
             WHERE agent_name = ?1",
            params![name, now],
        )?;
        Ok(())
    }

    pub fn update_escalation(
        &self,
        name: &str,
        level: u32,
        stalled_since: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE sessions SET escalation_level = ?2, stalled_since = ?3 WHERE agent_name = ?1",
            params![name, level, stalled_since],
        )?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<(), StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM sessions WHERE agent_name = ?1", params![name])?;
        Ok(())
    }

    /// Delete sessions matching the filter. Returns the number deleted.
    pub fn purge(&self, filter: &PurgeFilter) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count = match filter {
            PurgeFilter::All => conn.execute("DELETE FROM sessions", [])?,
            PurgeFilter::State(state) => conn.execute(
                "DELETE FROM sessions WHERE state = ?1",
                params![state.as_str()],
            )?,
            PurgeFilter::Agent(name) => {
                conn.execute("DELETE FROM sessions WHERE agent_name = ?1", params![name])?
            }
        };
        Ok(count)
    }

    /// Best-effort checkpoint before shutdown.
    pub fn close(&self) {
        db::checkpoint(&self.conn.lock());
    }

    // ── Run registry ─────────────────────────────────────────────────────

    pub fn create_run(&self, run: &Run) -> Result<(), StoreError> {
        // Concurrent spawns may race to create the same run; same id wins
        // idempotently.
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO runs (id, started_at, completed_at, agent_count,
                coordinator_session_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run.id,
                run.started_at,
                run.completed_at,
                run.agent_count,
                run.coordinator_session_id,
                run.status.as_str(),
            ],
        )?;
        Ok(())
    }

    pub fn complete_run(
        &self,
        id: &str,
        status: RunStatus,
        completed_at: &str,
    ) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE runs SET status = ?2, completed_at = ?3 WHERE id = ?1",
            params![id, status.as_str(), completed_at],
        )?;
        Ok(())
    }

    pub fn increment_agent_count(&self, id: &str) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "UPDATE runs SET agent_count = agent_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    pub fn get_run(&self, id: &str) -> Result<Option<Run>, StoreError> {
        self.conn
            .lock()
            .query_row(
                "SELECT id, started_at, completed_at, agent_count, coordinator_session_id, status
                 FROM runs WHERE id = ?1",
                params![id],
                row_to_run,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn get_runs(&self) -> Result<Vec<Run>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, started_at, completed_at, agent_count, coordinator_session_id, status
             FROM runs ORDER BY started_at",
        )?;
        let rows = stmt.query_map([], row_to_run)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    fn query_sessions(&self, sql: &str, args: &[&str]) -> Result<Vec<AgentSession>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_session)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}

const SELECT_SESSION: &str = "SELECT id, agent_name, capability, worktree_path, branch_name,
    bead_id, tmux_session, state, pid, parent_agent, depth, run_id,
    started_at, last_activity, stalled_since, escalation_level FROM sessions";

fn row_to_session(row: &Row<'_>) -> rusqlite::Result<AgentSession> {
    let capability: String = row.get(2)?;
    let state: String = row.get(7)?;
    Ok(AgentSession {
        id: row.get(0)?,
        agent_name: row.get(1)?,
        capability: Capability::from_str(&capability).unwrap_or(Capability::Builder),
        worktree_path: row.get(3)?,
        branch_name: row.get(4)?,
        bead_id: row.get(5)?,
        tmux_session: row.get(6)?,
        state: SessionState::from_str(&state).unwrap_or(SessionState::Zombie),
        pid: row.get(8)?,
        parent_agent: row.get(9)?,
        depth: row.get(10)?,
        run_id: row.get(11)?,
        started_at: row.get(12)?,
        last_activity: row.get(13)?,
        stalled_since: row.get(14)?,
        escalation_level: row.get(15)?,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<Run> {
    let status: String = row.get(5)?;
    Ok(Run {
        id: row.get(0)?,
        started_at: row.get(1)?,
        completed_at: row.get(2)?,
        agent_count: row.get(3)?,
        coordinator_session_id: row.get(4)?,
        status: RunStatus::from_str(&status).unwrap_or(RunStatus::Aborted),
    })
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
