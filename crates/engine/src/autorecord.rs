// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-record: after a worker session ends, capture what it learned.
//!
//! Three independent strands, each non-fatal: teach the expertise system
//! the domains the changed files touch, record insights mined from the
//! session's own events, and mail a summary to the parent agent.

use crate::quiet::quiet;
use ovs_core::{best_effort, AgentSession, Clock, Config, ControlDir, EventLevel};
use ovs_adapters::{ExpertiseClient, WorktreeAdapter};
use ovs_store::{EventStore, MailStore};
use std::path::Path;

pub struct AutoRecord<W: WorktreeAdapter, E: ExpertiseClient, C: Clock> {
    dir: ControlDir,
    events: EventStore,
    mail: MailStore,
    worktree: W,
    expertise: E,
    clock: C,
}

impl<W: WorktreeAdapter, E: ExpertiseClient, C: Clock> AutoRecord<W, E, C> {
    pub fn new(
        dir: ControlDir,
        events: EventStore,
        mail: MailStore,
        worktree: W,
        expertise: E,
        clock: C,
    ) -> Self {
        Self {
            dir,
            events,
            mail,
            worktree,
            expertise,
            clock,
        }
    }

    /// Run the full flow for a finished session.
    pub async fn run(&self, session: &AgentSession) {
        let config = Config::load(&self.dir.config_yaml()).unwrap_or_default();
        let changed = self.changed_files(session, &config).await;

        self.record_domains(session, &changed).await;
        self.record_insights(session).await;
        self.send_summary(session, &changed);
    }

    async fn changed_files(&self, session: &AgentSession, config: &Config) -> Vec<String> {
        match self
            .worktree
            .changed_files(Path::new(&session.worktree_path), &config.canonical_branch)
            .await
        {
            Ok(files) => files,
            Err(e) => {
                tracing::debug!(agent = %session.agent_name, error = %e, "diff unavailable");
                Vec::new()
            }
        }
    }

    async fn record_domains(&self, session: &AgentSession, changed: &[String]) {
        if changed.is_empty() {
            return;
        }
        let domains = match self.expertise.suggest_domains(changed).await {
            Ok(domains) => domains,
            Err(e) => {
                tracing::debug!(agent = %session.agent_name, error = %e, "domain suggestion failed");
                return;
            }
        };
        for domain in domains {
            let note = format!(
                "agent {} ({}) touched {} files for {}",
                session.agent_name,
                session.capability,
                changed.len(),
                session.bead_id
            );
            quiet("expertise-record", self.expertise.record(&domain, &note)).await;
        }
    }

    /// Mine the session's events for per-insight entries.
    async fn record_insights(&self, session: &AgentSession) {
        let stats = self
            .events
            .tool_stats(&session.agent_name, None)
            .unwrap_or_default();
        if let Some(top) = stats.first() {
            let insight = format!(
                "session {}: heaviest tool {} ({} uses, {}ms)",
                session.agent_name, top.tool_name, top.count, top.total_duration_ms
            );
            quiet(
                "insight-record",
                self.expertise.record("session-insight", &insight),
            )
            .await;
        }

        let errors = self
            .events
            .get_by_level(EventLevel::Error)
            .unwrap_or_default()
            .into_iter()
            .filter(|e| e.agent_name == session.agent_name)
            .count();
        if errors > 0 {
            let insight = format!(
                "session {}: {} error events before completion",
                session.agent_name, errors
            );
            quiet(
                "insight-record",
                self.expertise.record("session-insight", &insight),
            )
            .await;
        }
    }

    fn send_summary(&self, session: &AgentSession, changed: &[String]) {
        let to = session
            .parent_agent
            .clone()
            .unwrap_or_else(|| "orchestrator".to_string());
        let body = if changed.is_empty() {
            format!("{} finished {}; no files changed.", session.agent_name, session.bead_id)
        } else {
            format!(
                "{} finished {}; {} files changed: {}",
                session.agent_name,
                session.bead_id,
                changed.len(),
                changed.join(", ")
            )
        };
        best_effort("summary-mail", || {
            self.mail.send(
                &session.agent_name,
                &to,
                &format!("session complete: {}", session.agent_name),
                &body,
                ovs_core::MessageType::Result,
                ovs_core::MessagePriority::Normal,
                None,
                None,
                &self.clock.now_rfc3339(),
            )
        });
    }
}

#[cfg(test)]
#[path = "autorecord_tests.rs"]
mod tests;
