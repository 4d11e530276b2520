// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inter-agent mail.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Status,
    Result,
    Request,
    Question,
    Broadcast,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Status => "status",
            MessageType::Result => "result",
            MessageType::Request => "request",
            MessageType::Question => "question",
            MessageType::Broadcast => "broadcast",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "status" => Ok(MessageType::Status),
            "result" => Ok(MessageType::Result),
            "request" => Ok(MessageType::Request),
            "question" => Ok(MessageType::Question),
            "broadcast" => Ok(MessageType::Broadcast),
            other => Err(format!("unknown message type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Low,
    Normal,
    High,
}

impl MessagePriority {
    pub fn as_str(self) -> &'static str {
        match self {
            MessagePriority::Low => "low",
            MessagePriority::Normal => "normal",
            MessagePriority::High => "high",
        }
    }
}

impl fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessagePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(MessagePriority::Low),
            "normal" => Ok(MessagePriority::Normal),
            "high" => Ok(MessagePriority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

/// One mail message between agents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub priority: MessagePriority,
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Opaque structured payload
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

/// Synthesize a message id from sender, recipient, and timestamp.
///
/// First 16 hex characters of SHA-256 over `from|to|created_at`. Stable for
/// a given triple, which makes double-sends idempotent at the store layer.
pub fn message_hash(from: &str, to: &str, created_at: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(from.as_bytes());
    hasher.update(b"|");
    hasher.update(to.as_bytes());
    hasher.update(b"|");
    hasher.update(created_at.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
#[path = "mail_tests.rs"]
mod tests;
