// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The nudge bus: inject a short text message into a running agent's
//! terminal session.

use ovs_core::{best_effort, AgentEvent, Clock, ControlDir, EventType};
use ovs_adapters::MuxAdapter;
use ovs_store::{EventStore, SessionStore};
use std::collections::HashMap;
use std::time::Duration;

/// Minimum spacing between nudges to one agent.
pub const DEBOUNCE_MS: u64 = 500;

/// Send attempts before giving up.
const MAX_ATTEMPTS: u32 = 3;

/// Why a nudge was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeSkipReason {
    Debounced,
    NotFound,
    SessionDead,
    SendFailed,
}

/// Outcome of a nudge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NudgeOutcome {
    pub delivered: bool,
    pub reason: Option<NudgeSkipReason>,
}

impl NudgeOutcome {
    fn delivered() -> Self {
        Self {
            delivered: true,
            reason: None,
        }
    }

    fn dropped(reason: NudgeSkipReason) -> Self {
        Self {
            delivered: false,
            reason: Some(reason),
        }
    }
}

pub struct NudgeBus<M: MuxAdapter, C: Clock> {
    dir: ControlDir,
    sessions: SessionStore,
    events: EventStore,
    mux: M,
    clock: C,
    retry_delay: Duration,
    confirm_delay: Duration,
}

impl<M: MuxAdapter, C: Clock> NudgeBus<M, C> {
    pub fn new(
        dir: ControlDir,
        sessions: SessionStore,
        events: EventStore,
        mux: M,
        clock: C,
    ) -> Self {
        Self {
            dir,
            sessions,
            events,
            mux,
            clock,
            retry_delay: Duration::from_millis(500),
            confirm_delay: Duration::from_millis(500),
        }
    }

    /// Shrink the sleeps for tests.
    pub fn with_delays(mut self, retry: Duration, confirm: Duration) -> Self {
        self.retry_delay = retry;
        self.confirm_delay = confirm;
        self
    }

    /// Deliver `message` to `agent`'s terminal.
    ///
    /// `force` skips the debounce. Recording (timestamp, custom event) is
    /// fire-and-forget.
    pub async fn nudge(&self, agent: &str, message: &str, from: &str, force: bool) -> NudgeOutcome {
        let Some(target) = self.resolve_target(agent) else {
            return NudgeOutcome::dropped(NudgeSkipReason::NotFound);
        };

        let now = self.clock.now_ms();
        if !force && self.is_debounced(agent, now) {
            return NudgeOutcome::dropped(NudgeSkipReason::Debounced);
        }

        match self.mux.has_session(&target).await {
            Ok(true) => {}
            _ => return NudgeOutcome::dropped(NudgeSkipReason::SessionDead),
        }

        let mut delivered = false;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.mux.send_keys(&target, message).await {
                Ok(()) => {
                    tokio::time::sleep(self.confirm_delay).await;
                    let _ = self.mux.send_enter(&target).await;
                    delivered = true;
                    break;
                }
                Err(e) => {
                    tracing::debug!(agent, attempt, error = %e, "nudge send failed");
                    if attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        if !delivered {
            return NudgeOutcome::dropped(NudgeSkipReason::SendFailed);
        }

        self.record_nudge(agent, now);
        let mut event = AgentEvent::info(agent, EventType::Custom);
        event.data = Some(format!("nudge from {}: {}", from, message));
        event.created_at = self.clock.now_rfc3339();
        best_effort("nudge-event", || self.events.insert(&event));

        NudgeOutcome::delivered()
    }

    /// Registry first; the `orchestrator` sentinel falls back to the
    /// operator-session registration file.
    fn resolve_target(&self, agent: &str) -> Option<String> {
        if let Ok(Some(session)) = self.sessions.get_by_name(agent) {
            return Some(session.tmux_session);
        }
        if agent == "orchestrator" {
            let content = std::fs::read_to_string(self.dir.orchestrator_reg_file()).ok()?;
            let reg: serde_json::Value = serde_json::from_str(&content).ok()?;
            return reg
                .get("tmuxSession")
                .and_then(|v| v.as_str())
                .map(String::from);
        }
        None
    }

    fn is_debounced(&self, agent: &str, now_ms: u64) -> bool {
        let state = self.read_state();
        state
            .get(agent)
            .is_some_and(|&last| now_ms.saturating_sub(last) < DEBOUNCE_MS)
    }

    /// Rewrite the full state map, last-writer-wins. The only consumers are
    /// debounce and diagnostics.
    fn record_nudge(&self, agent: &str, now_ms: u64) {
        let mut state = self.read_state();
        state.insert(agent.to_string(), now_ms);
        best_effort("nudge-state", || {
            serde_json::to_string(&state)
                .map_err(|e| e.to_string())
                .and_then(|json| {
                    std::fs::write(self.dir.nudge_state_file(), json).map_err(|e| e.to_string())
                })
        });
    }

    fn read_state(&self) -> HashMap<String, u64> {
        std::fs::read_to_string(self.dir.nudge_state_file())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "nudge_tests.rs"]
mod tests;
