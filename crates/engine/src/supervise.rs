// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tier-1 supervision: the watchdog control loop.
//!
//! Reconciliation itself is a pure function over (state, pane liveness,
//! idle time); the watchdog applies verdicts against the registry, kills
//! zombie process trees, and enqueues nudges for stalled agents.

use crate::nudge::NudgeBus;
use crate::quiet::quiet;
use ovs_core::clock::ms_from_rfc3339;
use ovs_core::{
    best_effort, AgentEvent, AgentSession, Clock, ControlDir, EventLevel, EventType, SessionState,
};
use ovs_adapters::{MuxAdapter, ProcessTree};
use ovs_store::{EventStore, SessionStore};
use std::time::Duration;

/// Idle thresholds driving the state machine.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub stale_ms: u64,
    pub zombie_ms: u64,
}

/// Escalation action a reconciliation verdict can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    /// Stalled agent: enqueue a nudge with escalation-aware priority
    Investigate,
    /// Dead or zombie agent: kill the process tree and the mux session
    Terminate,
}

/// Outcome of reconciling one session against observed liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Verdict {
    pub next_state: Option<SessionState>,
    pub action: Option<SupervisorAction>,
    /// Touch `last_activity` (boot keepalive)
    pub refresh_activity: bool,
    /// Clear `stalled_since` and reset escalation
    pub clear_stalled: bool,
}

/// The reconciliation table. Total: every (state, pane-alive, idle) triple
/// has a defined outcome.
pub fn reconcile(
    state: SessionState,
    pane_alive: bool,
    idle_ms: u64,
    thresholds: &Thresholds,
) -> Verdict {
    if !pane_alive {
        // Terminal sessions need nothing; everything else is a zombie
        if state.is_terminal() {
            return Verdict::default();
        }
        return Verdict {
            next_state: Some(SessionState::Zombie),
            action: Some(SupervisorAction::Terminate),
            ..Verdict::default()
        };
    }

    match state {
        // Booting agents have not produced hook activity yet; the live pane
        // is their activity signal.
        SessionState::Booting => Verdict {
            refresh_activity: true,
            ..Verdict::default()
        },
        SessionState::Working if idle_ms >= thresholds.stale_ms => Verdict {
            next_state: Some(SessionState::Stalled),
            action: Some(SupervisorAction::Investigate),
            ..Verdict::default()
        },
        SessionState::Working => Verdict::default(),
        SessionState::Stalled if idle_ms >= thresholds.zombie_ms => Verdict {
            next_state: Some(SessionState::Zombie),
            action: Some(SupervisorAction::Terminate),
            ..Verdict::default()
        },
        SessionState::Stalled if idle_ms < thresholds.stale_ms => Verdict {
            next_state: Some(SessionState::Working),
            clear_stalled: true,
            ..Verdict::default()
        },
        SessionState::Stalled => Verdict::default(),
        SessionState::Completed | SessionState::Zombie => Verdict::default(),
    }
}

/// Tier-1 watchdog.
pub struct Watchdog<M: MuxAdapter, C: Clock> {
    dir: ControlDir,
    sessions: SessionStore,
    events: EventStore,
    nudges: NudgeBus<M, C>,
    mux: M,
    proc: ProcessTree,
    clock: C,
    thresholds: Thresholds,
    grace: Duration,
}

impl<M: MuxAdapter, C: Clock> Watchdog<M, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        dir: ControlDir,
        sessions: SessionStore,
        events: EventStore,
        nudges: NudgeBus<M, C>,
        mux: M,
        clock: C,
        thresholds: Thresholds,
    ) -> Self {
        Self {
            dir,
            sessions,
            events,
            nudges,
            mux,
            proc: ProcessTree::new(),
            clock,
            thresholds,
            grace: ovs_adapters::proc::DEFAULT_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// One supervision pass over every live session.
    pub async fn tick(&self) {
        let live = match self.sessions.get_active() {
            Ok(sessions) => sessions,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read session registry");
                return;
            }
        };

        for session in live {
            self.supervise_one(&session).await;
        }

        self.deliver_pending_nudges().await;
    }

    async fn supervise_one(&self, session: &AgentSession) {
        let pane_alive = self.probe_liveness(session).await;
        let now = self.clock.now_ms();
        let idle_ms = now.saturating_sub(ms_from_rfc3339(&session.last_activity).unwrap_or(now));

        let verdict = reconcile(session.state, pane_alive, idle_ms, &self.thresholds);

        if verdict.refresh_activity {
            best_effort("refresh-activity", || {
                self.sessions
                    .update_last_activity(&session.agent_name, &self.clock.now_rfc3339())
            });
        }

        if verdict.clear_stalled {
            best_effort("clear-stalled", || {
                self.sessions.update_escalation(&session.agent_name, 0, None)
            });
        }

        if let Some(next) = verdict.next_state {
            tracing::info!(
                agent = %session.agent_name,
                from = %session.state,
                to = %next,
                idle_ms,
                "state transition"
            );
            best_effort("update-state", || {
                self.sessions.update_state(&session.agent_name, next)
            });
            if next == SessionState::Stalled {
                best_effort("escalation", || {
                    self.sessions.update_escalation(
                        &session.agent_name,
                        session.escalation_level + 1,
                        Some(&self.clock.now_rfc3339()),
                    )
                });
            }
        }

        match verdict.action {
            Some(SupervisorAction::Terminate) => self.terminate(session).await,
            Some(SupervisorAction::Investigate) => self.investigate(session).await,
            None => {}
        }
    }

    /// Pane liveness: the mux session exists and its pane PID answers
    /// signal 0. Probe errors mean "no information" — treat as alive so a
    /// transient tmux hiccup never zombies a healthy agent.
    async fn probe_liveness(&self, session: &AgentSession) -> bool {
        match self.mux.has_session(&session.tmux_session).await {
            Ok(false) => false,
            Ok(true) => match self.mux.pane_pid(&session.tmux_session).await {
                Ok(Some(pid)) => self.proc.is_alive(pid),
                Ok(None) => false,
                Err(_) => true,
            },
            Err(e) => {
                tracing::debug!(agent = %session.agent_name, error = %e, "liveness probe failed");
                true
            }
        }
    }

    async fn terminate(&self, session: &AgentSession) {
        tracing::warn!(agent = %session.agent_name, "terminating zombie session");
        if let Ok(Some(pid)) = self.mux.pane_pid(&session.tmux_session).await {
            self.proc.kill_tree(pid, self.grace).await;
        } else if let Some(pid) = session.pid {
            self.proc.kill_tree(pid, self.grace).await;
        }
        quiet("mux-kill", self.mux.kill(&session.tmux_session)).await;

        let mut event = AgentEvent::info(&session.agent_name, EventType::Error);
        event.level = EventLevel::Error;
        event.run_id = session.run_id.clone();
        event.data = Some(format!(
            "terminated: escalation level {}",
            session.escalation_level
        ));
        event.created_at = self.clock.now_rfc3339();
        best_effort("terminate-event", || self.events.insert(&event));
    }

    async fn investigate(&self, session: &AgentSession) {
        let message = if session.escalation_level == 0 {
            "You appear stalled. Report status to your parent and continue your task.".to_string()
        } else {
            format!(
                "Still stalled (escalation {}). If you are blocked, mail your parent and wind down.",
                session.escalation_level + 1
            )
        };
        let outcome = self
            .nudges
            .nudge(&session.agent_name, &message, "watchdog", false)
            .await;
        tracing::info!(
            agent = %session.agent_name,
            delivered = outcome.delivered,
            reason = ?outcome.reason,
            "investigate nudge"
        );
    }

    /// Deliver nudges other components asked for via marker files.
    async fn deliver_pending_nudges(&self) {
        let Ok(entries) = std::fs::read_dir(self.dir.pending_nudges_dir()) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(agent) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            let message = std::fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok())
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| "You have pending fleet updates; check your mail.".to_string());

            let outcome = self.nudges.nudge(&agent, &message, "watchdog", false).await;
            if outcome.delivered || matches!(outcome.reason, Some(crate::NudgeSkipReason::NotFound))
            {
                let _ = std::fs::remove_file(&path);
            }
        }
    }
}

// ── Background daemon PID file ───────────────────────────────────────────────

/// Write the watchdog PID file.
pub fn write_pid_file(dir: &ControlDir, pid: u32) -> std::io::Result<()> {
    std::fs::write(dir.watchdog_pid_file(), pid.to_string())
}

/// Read the watchdog PID, if the file exists and parses.
pub fn read_pid_file(dir: &ControlDir) -> Option<u32> {
    std::fs::read_to_string(dir.watchdog_pid_file())
        .ok()
        .and_then(|content| content.trim().parse().ok())
}

/// Whether a background watchdog is running. Removes a stale PID file.
pub fn watchdog_running(dir: &ControlDir) -> bool {
    match read_pid_file(dir) {
        Some(pid) if ProcessTree::new().is_alive(pid) => true,
        Some(_) => {
            let _ = std::fs::remove_file(dir.watchdog_pid_file());
            false
        }
        None => false,
    }
}

/// Shutdown checkpoint: drop the PID file.
pub fn remove_pid_file(dir: &ControlDir) {
    let _ = std::fs::remove_file(dir.watchdog_pid_file());
}

#[cfg(test)]
#[path = "supervise_tests.rs"]
mod tests;
