// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status assembly for the CLI and the tier-2 monitor.

use ovs_core::{AgentSession, Run, TokenSnapshot};
use ovs_store::{MailStore, MetricsStore, SessionStore, StoreError};
use serde::Serialize;

/// Query options.
#[derive(Debug, Clone, Default)]
pub struct StatusQuery {
    /// Restrict to one agent
    pub agent: Option<String>,
    /// Include completed and zombie sessions
    pub all: bool,
}

/// One coherent view of the fleet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub sessions: Vec<AgentSession>,
    pub runs: Vec<Run>,
    pub latest_usage: Vec<TokenSnapshot>,
    pub unread_mail: Vec<(String, u64)>,
}

impl StatusSnapshot {
    /// Assemble from the stores.
    pub fn collect(
        sessions: &SessionStore,
        metrics: &MetricsStore,
        mail: &MailStore,
        query: &StatusQuery,
    ) -> Result<Self, StoreError> {
        let mut rows = if query.all {
            sessions.get_all()?
        } else {
            sessions.get_active()?
        };
        if let Some(agent) = &query.agent {
            rows.retain(|s| &s.agent_name == agent);
        }

        let mut unread_mail = Vec::new();
        for session in &rows {
            let count = mail.unread_count(&session.agent_name)?;
            if count > 0 {
                unread_mail.push((session.agent_name.clone(), count));
            }
        }

        Ok(Self {
            sessions: rows,
            runs: sessions.get_runs()?,
            latest_usage: metrics.latest_snapshots()?,
            unread_mail,
        })
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
