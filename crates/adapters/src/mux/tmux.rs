// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux multiplexer adapter

use super::{MuxAdapter, MuxError};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Tmux-based multiplexer adapter
#[derive(Clone, Default)]
pub struct TmuxAdapter;

impl TmuxAdapter {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str], description: &str) -> Result<std::process::Output, MuxError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, description)
            .await
            .map_err(MuxError::CommandFailed)
    }
}

#[async_trait]
impl MuxAdapter for TmuxAdapter {
    async fn create(
        &self,
        name: &str,
        cwd: &Path,
        cmd: &str,
        env: &[(String, String)],
    ) -> Result<(), MuxError> {
        // Precondition: cwd must exist
        if !cwd.exists() {
            return Err(MuxError::CreateFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        // A leftover session with the same name is stale; replace it
        if self.has_session(name).await.unwrap_or(false) {
            tracing::warn!(session = name, "session already exists, killing first");
            let _ = self.kill(name).await;
        }

        let mut tmux_cmd = Command::new("tmux");
        tmux_cmd
            .arg("new-session")
            .arg("-d")
            .arg("-s")
            .arg(name)
            .arg("-c")
            .arg(cwd);

        for (key, value) in env {
            tmux_cmd.arg("-e").arg(format!("{}={}", key, value));
        }

        tmux_cmd.arg(cmd);

        let output = run_with_timeout(tmux_cmd, TMUX_TIMEOUT, "tmux new-session")
            .await
            .map_err(MuxError::CreateFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session = name, stderr = %stderr, "tmux create failed");
            return Err(MuxError::CreateFailed(stderr.to_string()));
        }

        // Log stderr even on success - may contain useful warnings
        if !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(session = name, stderr = %stderr, "tmux create stderr (non-fatal)");
        }

        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<(), MuxError> {
        let output = self.run(&["kill-session", "-t", name], "tmux kill-session").await?;
        // "session not found" counts as success
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.contains("can't find session") && !stderr.contains("no server running") {
                tracing::debug!(session = name, stderr = %stderr, "kill-session failed");
            }
        }
        Ok(())
    }

    async fn has_session(&self, name: &str) -> Result<bool, MuxError> {
        let output = self.run(&["has-session", "-t", name], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn list(&self) -> Result<Vec<String>, MuxError> {
        let output = self
            .run(&["list-sessions", "-F", "#{session_name}"], "tmux list-sessions")
            .await?;
        if !output.status.success() {
            // No server running means no sessions
            return Ok(Vec::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|line| line.starts_with("overstory-"))
            .map(|line| line.to_string())
            .collect())
    }

    async fn send_keys(&self, name: &str, text: &str) -> Result<(), MuxError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = self
            .run(&["send-keys", "-t", name, "-l", "--", text], "tmux send-keys")
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn send_enter(&self, name: &str) -> Result<(), MuxError> {
        let output = self.run(&["send-keys", "-t", name, "Enter"], "tmux send-keys").await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(name.to_string()));
        }
        Ok(())
    }

    async fn capture(&self, name: &str) -> Result<String, MuxError> {
        let output = self
            .run(&["capture-pane", "-t", name, "-p"], "tmux capture-pane")
            .await?;
        if !output.status.success() {
            return Err(MuxError::NotFound(name.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn pane_pid(&self, name: &str) -> Result<Option<u32>, MuxError> {
        let output = self
            .run(&["list-panes", "-t", name, "-F", "#{pane_pid}"], "tmux list-panes")
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .and_then(|line| line.trim().parse().ok()))
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
