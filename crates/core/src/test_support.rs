// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates.

use crate::{
    AgentEvent, AgentSession, Capability, EventLevel, EventType, Message, MessagePriority,
    MessageType, SessionState,
};

/// A minimal live session row for tests.
pub fn session(name: &str) -> AgentSession {
    AgentSession {
        id: format!("sess-{}", name),
        agent_name: name.to_string(),
        capability: Capability::Builder,
        worktree_path: format!("/tmp/worktrees/{}", name),
        branch_name: crate::branch_name(name, "bead-1"),
        bead_id: "bead-1".to_string(),
        tmux_session: crate::mux_session_name("test", name),
        state: SessionState::Booting,
        pid: None,
        parent_agent: Some("L1".to_string()),
        depth: 1,
        run_id: Some("run-1".to_string()),
        started_at: "2026-01-01T00:00:00.000Z".to_string(),
        last_activity: "2026-01-01T00:00:00.000Z".to_string(),
        stalled_since: None,
        escalation_level: 0,
    }
}

/// A live session in a given state, started at a given epoch-ms instant.
pub fn session_started_at(name: &str, state: SessionState, started_ms: u64) -> AgentSession {
    let mut s = session(name);
    s.state = state;
    s.started_at = crate::clock::rfc3339_from_ms(started_ms);
    s.last_activity = s.started_at.clone();
    s
}

pub fn lead_session(name: &str) -> AgentSession {
    let mut s = session(name);
    s.capability = Capability::Lead;
    s.parent_agent = None;
    s.depth = 0;
    s
}

pub fn message(from: &str, to: &str, subject: &str) -> Message {
    let created_at = "2026-01-01T00:00:00.000Z".to_string();
    Message {
        id: crate::message_hash(from, to, &created_at),
        from: from.to_string(),
        to: to.to_string(),
        subject: subject.to_string(),
        body: String::new(),
        msg_type: MessageType::Status,
        priority: MessagePriority::Normal,
        thread_id: None,
        payload: None,
        read: false,
        created_at,
    }
}

pub fn tool_event(agent: &str, event_type: EventType, tool: &str, at: &str) -> AgentEvent {
    AgentEvent {
        run_id: None,
        agent_name: agent.to_string(),
        session_id: None,
        event_type,
        tool_name: Some(tool.to_string()),
        tool_args: None,
        tool_duration_ms: None,
        level: EventLevel::Info,
        data: None,
        created_at: at.to_string(),
    }
}
