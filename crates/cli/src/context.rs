// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command context: control directory discovery plus store handles.
//!
//! Constructed once per invocation and threaded into commands explicitly.

use anyhow::Result;
use ovs_adapters::{BeadTracker, GitWorktree, MulchExpertise, TmuxAdapter};
use ovs_core::{Config, ControlDir, SystemClock};
use ovs_engine::lifecycle::Lifecycle;
use ovs_engine::nudge::NudgeBus;
use ovs_engine::supervise::{Thresholds, Watchdog};
use ovs_engine::{autorecord::AutoRecord, hooks::HookIntake};
use ovs_store::{EventStore, MailStore, MergeQueueStore, MetricsStore, SessionStore};
use std::path::{Path, PathBuf};

pub struct Context {
    pub dir: ControlDir,
    pub config: Config,
    pub sessions: SessionStore,
    pub mail: MailStore,
    pub events: EventStore,
    pub metrics: MetricsStore,
    pub merge_queue: MergeQueueStore,
    /// Whether this open imported the legacy JSON registry
    pub migrated: bool,
}

impl Context {
    /// Open the context for the project enclosing `cwd`.
    pub fn open() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let project_root = find_project_root(&cwd);
        let dir = ControlDir::new(project_root);
        dir.ensure_layout()?;

        let config = Config::load(&dir.config_yaml())?;
        let (sessions, migrated) =
            SessionStore::open(&dir.sessions_db(), &dir.legacy_sessions_json())?;
        if migrated {
            tracing::info!("migrated legacy sessions.json into sessions.db");
        }

        Ok(Self {
            config,
            sessions,
            mail: MailStore::open(&dir.mail_db())?,
            events: EventStore::open(&dir.events_db())?,
            metrics: MetricsStore::open(&dir.metrics_db())?,
            merge_queue: MergeQueueStore::open(&dir.merge_queue_db())?,
            dir,
            migrated,
        })
    }

    pub fn lifecycle(
        &self,
    ) -> Lifecycle<TmuxAdapter, GitWorktree, BeadTracker, SystemClock> {
        Lifecycle::new(
            self.dir.clone(),
            self.sessions.clone(),
            TmuxAdapter::new(),
            GitWorktree::new(),
            BeadTracker::new(),
            SystemClock,
        )
    }

    pub fn nudge_bus(&self) -> NudgeBus<TmuxAdapter, SystemClock> {
        NudgeBus::new(
            self.dir.clone(),
            self.sessions.clone(),
            self.events.clone(),
            TmuxAdapter::new(),
            SystemClock,
        )
    }

    pub fn watchdog(&self) -> Watchdog<TmuxAdapter, SystemClock> {
        Watchdog::new(
            self.dir.clone(),
            self.sessions.clone(),
            self.events.clone(),
            self.nudge_bus(),
            TmuxAdapter::new(),
            SystemClock,
            Thresholds {
                stale_ms: self.config.stale_threshold_ms,
                zombie_ms: self.config.zombie_threshold_ms,
            },
        )
    }

    pub fn hook_intake(&self) -> HookIntake<SystemClock> {
        HookIntake::new(
            self.dir.clone(),
            self.sessions.clone(),
            self.events.clone(),
            self.metrics.clone(),
            SystemClock,
        )
    }

    pub fn auto_record(&self) -> AutoRecord<GitWorktree, MulchExpertise, SystemClock> {
        AutoRecord::new(
            self.dir.clone(),
            self.events.clone(),
            self.mail.clone(),
            GitWorktree::new(),
            MulchExpertise::new(),
            SystemClock,
        )
    }
}

/// Walk up from `cwd` to the nearest directory carrying a `.overstory`
/// control dir. Worktrees live under `.overstory/worktrees/`, so hooks
/// running inside them resolve to the enclosing project.
pub fn find_project_root(cwd: &Path) -> PathBuf {
    for ancestor in cwd.ancestors() {
        if ancestor.join(".overstory").is_dir() {
            return ancestor.to_path_buf();
        }
    }
    cwd.to_path_buf()
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
