// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mail store (`mail.db`): append-insert messages, read by filter,
//! acknowledge via `mark_read`.

use crate::db::{self, StoreError};
use ovs_core::{message_hash, Message, MessagePriority, MessageType};
use parking_lot::Mutex;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct MailStore {
    conn: Arc<Mutex<Connection>>,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    from_agent TEXT NOT NULL,
    to_agent TEXT NOT NULL,
    subject TEXT NOT NULL,
    body TEXT NOT NULL DEFAULT '',
    msg_type TEXT NOT NULL DEFAULT 'status',
    priority TEXT NOT NULL DEFAULT 'normal',
    thread_id TEXT,
    payload TEXT,
    read INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_to ON messages(to_agent);
CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id);
";

impl MailStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = db::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append a message. Same-id double sends are idempotent.
    pub fn insert(&self, m: &Message) -> Result<(), StoreError> {
        let payload = m
            .payload
            .as_ref()
            .map(|p| serde_json::to_string(p).unwrap_or_default());
        self.conn.lock().execute(
            "INSERT OR IGNORE INTO messages (id, from_agent, to_agent, subject, body,
                msg_type, priority, thread_id, payload, read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                m.id,
                m.from,
                m.to,
                m.subject,
                m.body,
                m.msg_type.as_str(),
                m.priority.as_str(),
                m.thread_id,
                payload,
                m.read,
                m.created_at,
            ],
        )?;
        Ok(())
    }

    /// Compose and append, synthesizing the id from (from, to, created_at).
    #[allow(clippy::too_many_arguments)]
    pub fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
        msg_type: MessageType,
        priority: MessagePriority,
        thread_id: Option<String>,
        payload: Option<serde_json::Value>,
        created_at: &str,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: message_hash(from, to, created_at),
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            msg_type,
            priority,
            thread_id,
            payload,
            read: false,
            created_at: created_at.to_string(),
        };
        self.insert(&message)?;
        Ok(message)
    }

    pub fn get_for(&self, to: &str, unread_only: bool) -> Result<Vec<Message>, StoreError> {
        let sql = if unread_only {
            format!(
                "{} WHERE to_agent = ?1 AND read = 0 ORDER BY created_at",
                SELECT
            )
        } else {
            format!("{} WHERE to_agent = ?1 ORDER BY created_at", SELECT)
        };
        self.query(&sql, &[to])
    }

    pub fn get_from(&self, from: &str) -> Result<Vec<Message>, StoreError> {
        self.query(
            &format!("{} WHERE from_agent = ?1 ORDER BY created_at", SELECT),
            &[from],
        )
    }

    pub fn get_thread(&self, thread_id: &str) -> Result<Vec<Message>, StoreError> {
        self.query(
            &format!("{} WHERE thread_id = ?1 ORDER BY created_at", SELECT),
            &[thread_id],
        )
    }

    pub fn mark_read(&self, id: &str) -> Result<(), StoreError> {
        self.conn
            .lock()
            .execute("UPDATE messages SET read = 1 WHERE id = ?1", params![id])?;
        Ok(())
    }

    pub fn unread_count(&self, to: &str) -> Result<u64, StoreError> {
        self.conn
            .lock()
            .query_row(
                "SELECT COUNT(*) FROM messages WHERE to_agent = ?1 AND read = 0",
                params![to],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }

    pub fn purge_all(&self) -> Result<usize, StoreError> {
        self.conn
            .lock()
            .execute("DELETE FROM messages", [])
            .map_err(Into::into)
    }

    fn query(&self, sql: &str, args: &[&str]) -> Result<Vec<Message>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args), row_to_message)?;
        rows.collect::<Result<_, _>>().map_err(Into::into)
    }
}

const SELECT: &str = "SELECT id, from_agent, to_agent, subject, body, msg_type, priority,
    thread_id, payload, read, created_at FROM messages";

fn row_to_message(row: &Row<'_>) -> rusqlite::Result<Message> {
    let msg_type: String = row.get(5)?;
    let priority: String = row.get(6)?;
    let payload: Option<String> = row.get(8)?;
    Ok(Message {
        id: row.get(0)?,
        from: row.get(1)?,
        to: row.get(2)?,
        subject: row.get(3)?,
        body: row.get(4)?,
        msg_type: MessageType::from_str(&msg_type).unwrap_or(MessageType::Status),
        priority: MessagePriority::from_str(&priority).unwrap_or(MessagePriority::Normal),
        thread_id: row.get(7)?,
        payload: payload.and_then(|p| serde_json::from_str(&p).ok()),
        read: row.get(9)?,
        created_at: row.get(10)?,
    })
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
