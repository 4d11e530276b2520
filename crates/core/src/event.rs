// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only observability events written by hook intake.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ToolStart,
    ToolEnd,
    SessionEnd,
    Error,
    Custom,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::ToolStart => "tool_start",
            EventType::ToolEnd => "tool_end",
            EventType::SessionEnd => "session_end",
            EventType::Error => "error",
            EventType::Custom => "custom",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tool_start" => Ok(EventType::ToolStart),
            "tool_end" => Ok(EventType::ToolEnd),
            "session_end" => Ok(EventType::SessionEnd),
            "error" => Ok(EventType::Error),
            "custom" => Ok(EventType::Custom),
            other => Err(format!("unknown event type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Warn,
    Error,
}

impl EventLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EventLevel::Info => "info",
            EventLevel::Warn => "warn",
            EventLevel::Error => "error",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(EventLevel::Info),
            "warn" => Ok(EventLevel::Warn),
            "error" => Ok(EventLevel::Error),
            other => Err(format!("unknown event level: {}", other)),
        }
    }
}

/// One observation row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    #[serde(default)]
    pub run_id: Option<String>,
    pub agent_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub event_type: EventType,
    #[serde(default)]
    pub tool_name: Option<String>,
    /// Filtered tool arguments (see the tool-argument filter)
    #[serde(default)]
    pub tool_args: Option<serde_json::Value>,
    #[serde(default)]
    pub tool_duration_ms: Option<u64>,
    pub level: EventLevel,
    #[serde(default)]
    pub data: Option<String>,
    pub created_at: String,
}

impl AgentEvent {
    /// An `info`-level event with the given type for `agent`.
    pub fn info(agent: impl Into<String>, event_type: EventType) -> Self {
        Self {
            run_id: None,
            agent_name: agent.into(),
            session_id: None,
            event_type,
            tool_name: None,
            tool_args: None,
            tool_duration_ms: None,
            level: EventLevel::Info,
            data: None,
            created_at: String::new(),
        }
    }
}
