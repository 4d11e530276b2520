// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal multiplexer adapters

mod tmux;

pub use tmux::TmuxAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeMuxAdapter, MuxCall};

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors from multiplexer operations
#[derive(Debug, Error)]
pub enum MuxError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("create failed: {0}")]
    CreateFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
}

/// Adapter for the terminal multiplexer that hosts agent sessions.
#[async_trait]
pub trait MuxAdapter: Clone + Send + Sync + 'static {
    /// Create a detached session running `cmd` in `cwd`.
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), MuxError>;

    /// Kill a session. A session that is already gone counts as success.
    async fn kill(&self, name: &str) -> Result<(), MuxError>;

    /// Check whether a session exists.
    async fn has_session(&self, name: &str) -> Result<bool, MuxError>;

    /// List session names carrying the overstory prefix.
    async fn list(&self) -> Result<Vec<String>, MuxError>;

    /// Send literal text to a session (no key-name interpretation).
    async fn send_keys(&self, name: &str, text: &str) -> Result<(), MuxError>;

    /// Send the Enter key to a session.
    async fn send_enter(&self, name: &str) -> Result<(), MuxError>;

    /// Capture the visible pane content.
    async fn capture(&self, name: &str) -> Result<String, MuxError>;

    /// PID of the pane's root process, when the session is alive.
    async fn pane_pid(&self, name: &str) -> Result<Option<u32>, MuxError>;
}
