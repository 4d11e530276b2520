// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-project control directory layout.
//!
//! Every file overstory owns lives under one directory (default
//! `{project_root}/.overstory`). All path knowledge is concentrated here so
//! the rest of the system never concatenates path strings.

use std::path::{Path, PathBuf};

/// Typed accessor for the control directory.
#[derive(Debug, Clone)]
pub struct ControlDir {
    root: PathBuf,
    project_root: PathBuf,
}

impl ControlDir {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            root: project_root.join(".overstory"),
            project_root,
        }
    }

    /// Use an explicit control root (tests point this at a temp dir).
    pub fn at(root: impl Into<PathBuf>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            project_root: project_root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Create the directory skeleton. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.agent_defs_dir())?;
        std::fs::create_dir_all(self.agents_dir())?;
        std::fs::create_dir_all(self.worktrees_dir())?;
        std::fs::create_dir_all(self.logs_root())?;
        std::fs::create_dir_all(self.pending_nudges_dir())?;
        Ok(())
    }

    pub fn config_yaml(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("agent-manifest.json")
    }

    pub fn agent_defs_dir(&self) -> PathBuf {
        self.root.join("agent-defs")
    }

    pub fn agents_dir(&self) -> PathBuf {
        self.root.join("agents")
    }

    pub fn identity_path(&self, agent: &str) -> PathBuf {
        self.agents_dir().join(agent).join("identity.yaml")
    }

    pub fn sessions_db(&self) -> PathBuf {
        self.root.join("sessions.db")
    }

    pub fn mail_db(&self) -> PathBuf {
        self.root.join("mail.db")
    }

    pub fn metrics_db(&self) -> PathBuf {
        self.root.join("metrics.db")
    }

    pub fn events_db(&self) -> PathBuf {
        self.root.join("events.db")
    }

    pub fn merge_queue_db(&self) -> PathBuf {
        self.root.join("merge-queue.db")
    }

    /// Legacy registry, read once for migration, never written.
    pub fn legacy_sessions_json(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    pub fn worktrees_dir(&self) -> PathBuf {
        self.root.join("worktrees")
    }

    pub fn worktree_path(&self, agent: &str) -> PathBuf {
        self.worktrees_dir().join(agent)
    }

    pub fn logs_root(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn logs_dir(&self, agent: &str) -> PathBuf {
        self.logs_root().join(agent)
    }

    /// Pointer file to the active log directory for an agent.
    pub fn current_session_pointer(&self, agent: &str) -> PathBuf {
        self.logs_dir(agent).join(".current-session")
    }

    /// Epoch-ms of the most recent token snapshot (debounce file).
    pub fn last_snapshot_path(&self, agent: &str) -> PathBuf {
        self.logs_dir(agent).join(".last-snapshot")
    }

    /// Cached transcript discovery result.
    pub fn transcript_cache_path(&self, agent: &str) -> PathBuf {
        self.logs_dir(agent).join(".transcript-path")
    }

    /// Active run id. Empty or absent means no active run.
    pub fn current_run_file(&self) -> PathBuf {
        self.root.join("current-run.txt")
    }

    pub fn nudge_state_file(&self) -> PathBuf {
        self.root.join("nudge-state.json")
    }

    /// Operator-session registration written by the prime command.
    pub fn orchestrator_reg_file(&self) -> PathBuf {
        self.root.join("orchestrator-tmux.json")
    }

    pub fn pending_nudges_dir(&self) -> PathBuf {
        self.root.join("pending-nudges")
    }

    pub fn pending_nudge_path(&self, agent: &str) -> PathBuf {
        self.pending_nudges_dir().join(format!("{}.json", agent))
    }

    pub fn watchdog_pid_file(&self) -> PathBuf {
        self.root.join("watchdog.pid")
    }

    pub fn watchdog_log_file(&self) -> PathBuf {
        self.root.join("watchdog.log")
    }

    pub fn hooks_manifest_path(&self) -> PathBuf {
        self.root.join("hooks.json")
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
