// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook intake: the `log` entry point the AI runner's hooks invoke.
//!
//! Everything here is an observability write. A failing store, a missing
//! transcript, an unreadable log directory — none of it may break the
//! hook, because a failing hook breaks the agent's turn. The only fatal
//! outcome is a payload that cannot be read at all.

use crate::filter::filter_tool_args;
use crate::transcript;
use ovs_core::clock::ms_from_rfc3339;
use ovs_core::{
    best_effort, AgentEvent, AgentSession, Clock, ControlDir, EventLevel, EventType,
    SessionMetrics, SessionState, TokenSnapshot,
};
use ovs_store::{EventStore, MetricsStore, SessionStore};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Minimum spacing between token snapshots per agent.
const SNAPSHOT_THROTTLE_MS: u64 = 30_000;

/// JSON payload a hook delivers on stdin.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookPayload {
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<serde_json::Value>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
}

impl HookPayload {
    pub fn from_json(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

/// What `session-end` decided, so the caller can run auto-record.
#[derive(Debug, Clone)]
pub struct SessionEndOutcome {
    /// Set when a non-persistent session transitioned to completed
    pub completed: Option<AgentSession>,
}

pub struct HookIntake<C: Clock> {
    dir: ControlDir,
    sessions: SessionStore,
    events: EventStore,
    metrics: MetricsStore,
    clock: C,
}

impl<C: Clock> HookIntake<C> {
    pub fn new(
        dir: ControlDir,
        sessions: SessionStore,
        events: EventStore,
        metrics: MetricsStore,
        clock: C,
    ) -> Self {
        Self {
            dir,
            sessions,
            events,
            metrics,
            clock,
        }
    }

    pub fn handle_tool_start(&self, agent: &str, payload: &HookPayload) {
        let tool = payload.tool_name.as_deref().unwrap_or("unknown");
        self.append_legacy_log(agent, "tools", &format!("start {}", tool));

        // First activity flips booting to working
        best_effort("mark-active", || {
            self.sessions.mark_active(agent, &self.clock.now_rfc3339())
        });

        let empty = serde_json::Value::Null;
        let input = payload.tool_input.as_ref().unwrap_or(&empty);
        let (filtered, summary) = filter_tool_args(tool, input);

        let mut event = self.base_event(agent, EventType::ToolStart, payload);
        event.tool_name = Some(tool.to_string());
        event.tool_args = Some(serde_json::Value::Object(filtered));
        event.data = Some(summary);
        best_effort("tool-start-event", || self.events.insert(&event));
    }

    pub fn handle_tool_end(&self, agent: &str, payload: &HookPayload) {
        let tool = payload.tool_name.as_deref().unwrap_or("unknown");
        self.append_legacy_log(agent, "tools", &format!("end {}", tool));

        best_effort("activity", || {
            self.sessions
                .update_last_activity(agent, &self.clock.now_rfc3339())
        });

        // Fill the matching start's duration; carry it on the end event too
        let mut duration = None;
        best_effort("correlate", || {
            self.events
                .correlate_tool_end(agent, tool, self.clock.now_ms())
                .map(|correlated| {
                    duration = correlated.and_then(|start| start.tool_duration_ms);
                })
        });

        let mut event = self.base_event(agent, EventType::ToolEnd, payload);
        event.tool_name = Some(tool.to_string());
        event.tool_duration_ms = duration;
        best_effort("tool-end-event", || self.events.insert(&event));

        if payload.session_id.is_some() {
            self.maybe_snapshot(agent, payload);
        }
    }

    /// Session end. Persistent agents only get an activity bump — their
    /// Stop hook fires every turn, not just at the end of life.
    pub fn handle_session_end(&self, agent: &str, payload: &HookPayload) -> SessionEndOutcome {
        self.append_legacy_log(agent, "events", "session-end");

        let session = self.sessions.get_by_name(agent).ok().flatten();
        let Some(session) = session else {
            // Unknown agent: record the event and move on
            let event = self.base_event(agent, EventType::SessionEnd, payload);
            best_effort("session-end-event", || self.events.insert(&event));
            return SessionEndOutcome { completed: None };
        };

        if session.capability.is_persistent() {
            best_effort("activity", || {
                self.sessions
                    .update_last_activity(agent, &self.clock.now_rfc3339())
            });
            let event = self.base_event(agent, EventType::SessionEnd, payload);
            best_effort("session-end-event", || self.events.insert(&event));
            return SessionEndOutcome { completed: None };
        }

        best_effort("complete", || {
            self.sessions.update_state(agent, SessionState::Completed)
        });

        self.record_final_metrics(&session, payload);

        // A finished lead means the coordinator should reassess the fleet;
        // ask the next supervision pass to nudge it.
        if session.capability == ovs_core::Capability::Lead {
            best_effort("coordinator-marker", || {
                let marker = serde_json::json!({
                    "message": format!("Lead '{}' finished; review its results and your fleet.", agent),
                    "from": agent,
                });
                std::fs::create_dir_all(self.dir.pending_nudges_dir()).and_then(|()| {
                    std::fs::write(
                        self.dir.pending_nudge_path("coordinator"),
                        marker.to_string(),
                    )
                })
            });
        }

        let event = self.base_event(agent, EventType::SessionEnd, payload);
        best_effort("session-end-event", || self.events.insert(&event));

        SessionEndOutcome {
            completed: Some(session),
        }
    }

    fn base_event(&self, agent: &str, event_type: EventType, payload: &HookPayload) -> AgentEvent {
        let run_id = self
            .sessions
            .get_by_name(agent)
            .ok()
            .flatten()
            .and_then(|s| s.run_id);
        AgentEvent {
            run_id,
            agent_name: agent.to_string(),
            session_id: payload.session_id.clone(),
            event_type,
            tool_name: None,
            tool_args: None,
            tool_duration_ms: None,
            level: EventLevel::Info,
            data: None,
            created_at: self.clock.now_rfc3339(),
        }
    }

    /// Throttled token snapshot from the transcript.
    fn maybe_snapshot(&self, agent: &str, payload: &HookPayload) {
        let now = self.clock.now_ms();
        let throttle_file = self.dir.last_snapshot_path(agent);
        let last = std::fs::read_to_string(&throttle_file)
            .ok()
            .and_then(|content| content.trim().parse::<u64>().ok())
            .unwrap_or(0);
        if now.saturating_sub(last) < SNAPSHOT_THROTTLE_MS {
            return;
        }

        let Some(path) = self.resolve_transcript(agent, payload) else {
            return;
        };
        let (totals, model) = transcript::parse_usage(&path);
        if totals.is_zero() {
            return;
        }

        best_effort("snapshot", || {
            self.metrics.record_snapshot(&TokenSnapshot {
                agent_name: agent.to_string(),
                tokens: totals,
                model_used: model,
                created_at: self.clock.now_rfc3339(),
            })
        });
        best_effort("snapshot-throttle", || {
            std::fs::create_dir_all(self.dir.logs_dir(agent))
                .and_then(|()| std::fs::write(&throttle_file, now.to_string()))
        });
    }

    /// Payload path first, then the cached pointer, then cache discovery.
    fn resolve_transcript(&self, agent: &str, payload: &HookPayload) -> Option<PathBuf> {
        if let Some(explicit) = payload.transcript_path.as_deref() {
            let path = PathBuf::from(explicit);
            if path.exists() {
                self.cache_transcript(agent, &path);
                return Some(path);
            }
        }

        let cache_file = self.dir.transcript_cache_path(agent);
        if let Ok(cached) = std::fs::read_to_string(&cache_file) {
            let path = PathBuf::from(cached.trim());
            if path.exists() {
                return Some(path);
            }
        }

        let session = self.sessions.get_by_name(agent).ok().flatten()?;
        let found = transcript::find_transcript(
            Path::new(&session.worktree_path),
            payload.session_id.as_deref().unwrap_or(""),
        )?;
        self.cache_transcript(agent, &found);
        Some(found)
    }

    fn cache_transcript(&self, agent: &str, path: &Path) {
        best_effort("transcript-cache", || {
            std::fs::create_dir_all(self.dir.logs_dir(agent)).and_then(|()| {
                std::fs::write(
                    self.dir.transcript_cache_path(agent),
                    path.display().to_string(),
                )
            })
        });
    }

    fn record_final_metrics(&self, session: &AgentSession, payload: &HookPayload) {
        let totals_and_model = self
            .resolve_transcript(&session.agent_name, payload)
            .map(|path| transcript::parse_usage(&path));
        let (totals, model) = totals_and_model.unwrap_or_default();

        let duration_ms = ms_from_rfc3339(&session.started_at)
            .map(|started| self.clock.now_ms().saturating_sub(started));

        best_effort("final-metrics", || {
            self.metrics.upsert(&SessionMetrics {
                agent_name: session.agent_name.clone(),
                bead_id: session.bead_id.clone(),
                tokens: totals,
                estimated_cost_usd: transcript::estimate_cost(&totals, model.as_deref()),
                model_used: model.clone(),
                duration_ms,
                merge_result: None,
                parent_agent: session.parent_agent.clone(),
                run_id: session.run_id.clone(),
            })
        });
    }

    /// Per-agent legacy text log, fire-and-forget. Kept for operators'
    /// muscle memory; the event store is the source of truth.
    fn append_legacy_log(&self, agent: &str, stream: &str, line: &str) {
        best_effort("legacy-log", || -> std::io::Result<()> {
            let logs_dir = self.dir.logs_dir(agent);
            std::fs::create_dir_all(&logs_dir)?;

            let pointer = self.dir.current_session_pointer(agent);
            let session_dir = match std::fs::read_to_string(&pointer) {
                Ok(existing) if logs_dir.join(existing.trim()).is_dir() => {
                    logs_dir.join(existing.trim())
                }
                _ => {
                    let stamp = self.clock.now_rfc3339().replace(':', "-");
                    let fresh = logs_dir.join(&stamp);
                    std::fs::create_dir_all(&fresh)?;
                    std::fs::write(&pointer, stamp)?;
                    fresh
                }
            };

            let entry = serde_json::json!({
                "at": self.clock.now_rfc3339(),
                "line": line,
            });
            use std::io::Write;
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(session_dir.join(format!("{}.ndjson", stream)))?;
            writeln!(file, "{}", entry)
        });
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
