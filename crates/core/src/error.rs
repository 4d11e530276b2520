// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed failure taxonomy surfaced by the lifecycle engine.
//!
//! Library crates carry their own narrow error enums (`MuxError`,
//! `StoreError`, ...); the engine translates everything user-facing into one
//! of these kinds, and the CLI maps kinds to exit codes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverstoryError {
    /// Bad inputs: missing flag, unknown capability, bad number. Names the
    /// offending field. Never retried.
    #[error("{0}")]
    Validation(String),

    /// Attempted spawn violates the hierarchy rule.
    #[error("agent '{agent_name}' cannot be spawned as '{requested_capability}' without a parent; only lead agents spawn at the top of the hierarchy")]
    Hierarchy {
        agent_name: String,
        requested_capability: String,
    },

    /// Lifecycle failure: collision, limit reached, tracker or multiplexer
    /// refusal, privilege rejection, depth exceeded.
    #[error("agent '{agent_name}': {message}")]
    Agent { agent_name: String, message: String },

    /// Configuration unparseable or semantically invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Residual kind for rare internal faults.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OverstoryError {
    pub fn agent(name: impl Into<String>, message: impl Into<String>) -> Self {
        OverstoryError::Agent {
            agent_name: name.into(),
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        OverstoryError::Validation(message.into())
    }

    /// Process exit code for a user-initiated command that hit this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            OverstoryError::Validation(_)
            | OverstoryError::Hierarchy { .. }
            | OverstoryError::Config(_) => 1,
            OverstoryError::Agent { .. } => 2,
            OverstoryError::Internal(_) => 3,
        }
    }
}

/// Run an observability write and swallow any failure.
///
/// Hook intake, auto-record, nudge recording, snapshot recording, identity
/// updates, and event-store writes must never abort the surrounding action.
/// The user-visible signal of a failure here is the absence of the
/// observation, plus a debug-level trace line.
pub fn best_effort<T, E: std::fmt::Display>(label: &str, f: impl FnOnce() -> Result<T, E>) {
    if let Err(e) = f() {
        tracing::debug!(label, error = %e, "best-effort operation failed");
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
