// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event store (`events.db`): append-only observations from hook intake.
//!
//! Correlation policy: a `tool_end` matches the most recent `tool_start`
//! for the same (agent, tool) that has no duration yet. Overlapping uses of
//! the same tool by one agent can mis-correlate; accepted limitation.

use crate::db::{self, StoreError};
use ovs_core::clock::ms_from_rfc3339;
use ovs_core::{AgentEvent, EventLevel, EventType};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Per-tool aggregate used by the session-insight analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStat {
    pub tool_name: String,
    pub count: u64,
    pub total_duration_ms: u64,
}

#[derive(Clone)]
pub struct EventStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id TEXT,
    agent_name TEXT NOT NULL,
    session_id TEXT,
    event_type TEXT NOT NULL,
    tool_name TEXT,
    tool_args TEXT,
    tool_duration_ms INTEGER,
    level TEXT NOT NULL DEFAULT 'info',
    data TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_events_agent ON events(agent_name);
CREATE INDEX IF NOT EXISTS idx_events_run ON events(run_id);
";

impl EventStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn insert(&self, e: &AgentEvent) -> Result<(), StoreError> {
        let tool_args = e
            .tool_args
            .as_ref()
            .map(|a| serde_json::to_string(a).unwrap_or_default());
        self.conn.lock().execute(
            "INSERT INTO events (run_id, agent_name, session_id, event_type, tool_name,
                tool_args, tool_duration_ms, level, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                e.run_id,
                e.agent_name,
                e.session_id,
                e.event_type.as_str(),
                e.tool_name,
                tool_args,
                e.tool_duration_ms,
                e.level.as_str(),
                e.data,
                e.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn get_for_agent(
        &self,
        agent: &str,
        since: Option<&str>,
        limit: Option<u64>,
    ) -> Result<Vec<AgentEvent>, StoreError> {
        let mut sql = format!("{} WHERE agent_name = ?1", SELECT);
        if since.is_some() {
            sql.push_str(" AND created_at >= ?2");
        }
        sql.push_str(" ORDER BY id");
        if let Some(n) = limit {
            sql.push_str(&format!(" LIMIT {}", n));
        }
        let mut args: Vec<&str> = vec![agent];
        if let Some(s) = since {
            args.push(s);
        }
        self.query(&sql, &args)
    }

    pub fn get_for_run(&self, run_id: &str) -> Result<Vec<AgentEvent>, StoreError> {
        self.query(&format!("{} WHERE run_id = ?1 ORDER BY id", SELECT), &[run_id])
    }

    pub fn get_by_level(&self, level: EventLevel) -> Result<Vec<AgentEvent>, StoreError> {
        self.query(
            &format!("{} WHERE level = ?1 ORDER BY id", SELECT),
            &[level.as_str()],
        )
    }

    /// Find the most recent open `tool_start` for (agent, tool), fill its
    /// duration relative to `now`, and return the updated row.
    ///
    /// Returns `None` when no open start exists.
    pub fn correlate_tool_end(
        &self,
        agent: &str,
        tool: &str,
        now_ms: u64,
    ) -> Result<Option<AgentEvent>, StoreError> {
        let conn = self.conn.lock();
        let open_start = conn
            .query_row(
                &format!(
                    "{} WHERE agent_name = ?1 AND tool_name = ?2
                        AND event_type = 'tool_start' AND tool_duration_ms IS NULL
                     ORDER BY id DESC LIMIT 1",
                    SELECT_WITH_ID
                ),
                params![agent, tool],
                |row| {
                    let id: i64 = row.get(0)?;
                    let created_at: String = row.get(10)?;
                    Ok((id, created_at))
                },
            )
            .optional()?;

        let Some((id, created_at)) = open_start else {
            return Ok(None);
        };

        let started_ms = ms_from_rfc3339(&created_at).unwrap_or(now_ms);
        let duration = now_ms.saturating_sub(started_ms);
        conn.execute(
            "UPDATE events SET tool_duration_ms = ?2 WHERE id = ?1",
            params![id, duration],
        )?;

        conn.query_row(
            &format!("{} WHERE id = ?1", SELECT),
            params![id],
            row_to_event,
        )
        .optional()
        .map_err(Into::into)
    }

    /// Per-tool counts and durations for an agent, optionally since a
    /// timestamp. Counts `tool_start` events; durations come from the
    /// correlated starts.
    pub fn tool_stats(&self, agent: &str, since: Option<&str>) -> Result<Vec<ToolStat>, StoreError> {
        let mut sql = "SELECT tool_name, COUNT(*), COALESCE(SUM(tool_duration_ms), 0)
             FROM events
             WHERE agent_name = ?1 AND event_type = 'tool_start' AND tool_name IS NOT NULL"
            .to_string();
        if since.is_some() {
            sql.push_str(" AND created_at >= ?2");
        }
        sql.push_str(" GROUP BY tool_name ORDER BY COUNT(*) DESC");

        let mut args: Vec<&str> = vec![agent];
        if let Some(s) = since {
            args.push(s);
        }

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(&args), |row| {
            Ok(ToolStat {
                tool_name: row.get(0)?,
                count: row.get(1)?,
                total_duration_ms: row.get(2)?,
            })
        })?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }

    pub fn purge_all(&self) -> Result<usize, StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM events", [])
            .map_err(Into::into)
    }

    fn query(&self, sql: &str, args: &[&str]) -> Result<Vec<AgentEvent>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_event)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}

const SELECT: &str = "SELECT run_id, agent_name, session_id, event_type, tool_name,
    tool_args, tool_duration_ms, level, data, created_at FROM events";

const SELECT_WITH_ID: &str = "SELECT id, run_id, agent_name, session_id, event_type, tool_name,
    tool_args, tool_duration_ms, level, data, created_at FROM events";

fn row_to_event(row: &Row<'_>) -> rusqlite::Result<AgentEvent> {
    let event_type: String = row.get(3)?;
    let level: String = row.get(7)?;
    let tool_args: Option<String> = row.get(5)?;
    Ok(AgentEvent {
        run_id: row.get(0)?,
        agent_name: row.get(1)?,
        session_id: row.get(2)?,
        event_type: EventType::from_str(&event_type).unwrap_or(EventType::Custom),
        tool_name: row.get(4)?,
        tool_args: tool_args.and_then(|a| serde_json::from_str(&a).ok()),
        tool_duration_ms: row.get(6)?,
        level: EventLevel::from_str(&level).unwrap_or(EventLevel::Info),
        data: row.get(8)?,
        created_at: row.get(9)?,
    })
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
