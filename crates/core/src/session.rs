// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session row and state machine vocabulary.
//!
//! One `AgentSession` per known agent. The registry enforces exactly-one row
//! per `agent_name` (upsert semantics); the lifecycle engine writes the birth
//! row, hook intake and the supervision loop mutate it afterwards.

use crate::Capability;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of an agent session.
///
/// Initial `Booting`; terminal `Completed` or `Zombie`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Booting,
    Working,
    Stalled,
    Completed,
    Zombie,
}

impl SessionState {
    /// Live states count against the concurrency limit and are patrolled by
    /// the watchdog.
    pub fn is_live(self) -> bool {
        matches!(
            self,
            SessionState::Booting | SessionState::Working | SessionState::Stalled
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Booting => "booting",
            SessionState::Working => "working",
            SessionState::Stalled => "stalled",
            SessionState::Completed => "completed",
            SessionState::Zombie => "zombie",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "booting" => Ok(SessionState::Booting),
            "working" => Ok(SessionState::Working),
            "stalled" => Ok(SessionState::Stalled),
            "completed" => Ok(SessionState::Completed),
            "zombie" => Ok(SessionState::Zombie),
            other => Err(format!("unknown session state: {}", other)),
        }
    }
}

/// One row per known agent.
///
/// Serde names match the legacy JSON registry (`sessions.json`) so the
/// migration path can deserialize old entries directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSession {
    /// Unique session identifier
    pub id: String,
    /// Human-chosen name, unique across the live registry
    pub agent_name: String,
    pub capability: Capability,
    /// Absolute path to the working copy (project root for persistent agents)
    pub worktree_path: String,
    /// Branch owned exclusively by this session
    pub branch_name: String,
    /// Work-item id; empty for persistent agents
    #[serde(default)]
    pub bead_id: String,
    /// Multiplexer session name: `overstory-{project}-{agent}`
    pub tmux_session: String,
    pub state: SessionState,
    #[serde(default)]
    pub pid: Option<u32>,
    /// Name of the spawning agent; `None` at the top of the hierarchy
    #[serde(default)]
    pub parent_agent: Option<String>,
    #[serde(default)]
    pub depth: u32,
    /// Enclosing work batch; `None` for coordinator/monitor
    #[serde(default)]
    pub run_id: Option<String>,
    /// RFC 3339 UTC, millisecond precision
    pub started_at: String,
    pub last_activity: String,
    #[serde(default)]
    pub stalled_since: Option<String>,
    /// Monotonic while stalled; resets when activity resumes
    #[serde(default)]
    pub escalation_level: u32,
}

/// Multiplexer session name for an agent: `overstory-{project}-{agent}`.
pub fn mux_session_name(project: &str, agent: &str) -> String {
    format!("overstory-{}-{}", project, agent)
}

/// Branch name for a worker: `overstory/{agent}/{bead}`.
pub fn branch_name(agent: &str, bead_id: &str) -> String {
    format!("overstory/{}/{}", agent, bead_id)
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
