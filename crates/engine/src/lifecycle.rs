// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent-lifecycle engine: worker spawn (`sling`), persistent agents
//! (coordinator, monitor), and the stop path.
//!
//! Spawn is an ordered pipeline. The one ordering guarantee made to hook
//! intake is that the session row is registered *before* the beacon is
//! sent, so activity updates never arrive for an unknown agent. Failures
//! after worktree creation tear the worktree down; failures after mux
//! creation tear the session down.

use crate::beacon::{self, BeaconTimings};
use crate::materialize::{self, OverlayContext};
use crate::quiet::quiet;
use crate::stagger::calculate_stagger_delay;
use ovs_adapters::{MuxAdapter, ProcessTree, TrackerClient, WorktreeAdapter};
use ovs_core::{
    best_effort, branch_name, mux_session_name, AgentSession, Capability, CapabilityManifest,
    Clock, Config, ControlDir, IdGen, OverstoryError, Run, RunStatus, SessionState, UuidIdGen,
};
use ovs_store::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Inputs to a worker spawn.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub bead_id: String,
    pub capability: Capability,
    pub name: String,
    pub spec_path: Option<PathBuf>,
    pub files: Vec<String>,
    pub parent_agent: Option<String>,
    pub depth: u32,
    pub force_hierarchy: bool,
}

pub use crate::beacon::BeaconTimings as SpawnTimings;

pub struct Lifecycle<M, W, T, C, G = UuidIdGen>
where
    M: MuxAdapter,
    W: WorktreeAdapter,
    T: TrackerClient,
    C: Clock,
    G: IdGen,
{
    dir: ControlDir,
    sessions: SessionStore,
    mux: M,
    worktree: W,
    tracker: T,
    clock: C,
    ids: G,
    proc: ProcessTree,
    timings: BeaconTimings,
    /// Injected so tests can exercise the privilege gate either way.
    root_probe: Arc<dyn Fn() -> bool + Send + Sync>,
}

impl<M, W, T, C> Lifecycle<M, W, T, C, UuidIdGen>
where
    M: MuxAdapter,
    W: WorktreeAdapter,
    T: TrackerClient,
    C: Clock,
{
    pub fn new(
        dir: ControlDir,
        sessions: SessionStore,
        mux: M,
        worktree: W,
        tracker: T,
        clock: C,
    ) -> Self {
        Self {
            dir,
            sessions,
            mux,
            worktree,
            tracker,
            clock,
            ids: UuidIdGen,
            proc: ProcessTree::new(),
            timings: BeaconTimings::default(),
            // OVERSTORY_ALLOW_ROOT opts CI containers out of the gate
            root_probe: Arc::new(|| {
                std::env::var_os("OVERSTORY_ALLOW_ROOT").is_none()
                    && nix::unistd::geteuid().is_root()
            }),
        }
    }
}

impl<M, W, T, C, G> Lifecycle<M, W, T, C, G>
where
    M: MuxAdapter,
    W: WorktreeAdapter,
    T: TrackerClient,
    C: Clock,
    G: IdGen,
{
    pub fn with_timings(mut self, timings: BeaconTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_root_probe(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.root_probe = Arc::new(probe);
        self
    }

    /// Spawn a worker agent. See the module docs for the ordering contract.
    pub async fn spawn(&self, req: SpawnRequest) -> Result<AgentSession, OverstoryError> {
        // 1. Validation
        if req.name.trim().is_empty() {
            return Err(OverstoryError::validation("name is required"));
        }
        if req.bead_id.trim().is_empty() {
            return Err(OverstoryError::validation("beadId is required"));
        }
        if req.capability.is_persistent() {
            return Err(OverstoryError::validation(
                "capability: persistent agents start via 'coordinator start' or 'monitor start'",
            ));
        }
        let spec_path = match &req.spec_path {
            Some(p) => Some(std::fs::canonicalize(p).map_err(|_| {
                OverstoryError::validation(format!("spec: file not found: {}", p.display()))
            })?),
            None => None,
        };

        // 2. The AI runner rejects dangerous permissions under privilege
        if (self.root_probe)() {
            return Err(OverstoryError::agent(
                &req.name,
                "refusing to spawn agents as root; the runner would reject its permissions",
            ));
        }

        // 3. Configuration and capability manifest
        let config = Config::load(&self.dir.config_yaml())?;
        let manifest = CapabilityManifest::load(&self.dir.manifest_path())?;

        // 4. Hierarchy gate: only leads spawn at the top
        if req.parent_agent.is_none()
            && req.capability != Capability::Lead
            && !req.force_hierarchy
        {
            return Err(OverstoryError::Hierarchy {
                agent_name: req.name.clone(),
                requested_capability: req.capability.to_string(),
            });
        }

        // 5. Depth cap
        if req.depth > config.max_depth {
            return Err(OverstoryError::agent(
                &req.name,
                format!("depth {} exceeds maxDepth {}", req.depth, config.max_depth),
            ));
        }

        // 6. Capability must be defined
        let Some(cap_def) = manifest.get(req.capability).cloned() else {
            return Err(OverstoryError::validation(format!(
                "capability '{}' is not defined in the agent manifest",
                req.capability
            )));
        };

        // 7. Resolve or create the enclosing run
        let run_id = self.resolve_run_id()?;

        // 8. Registry claim
        let active = self
            .sessions
            .get_active()
            .map_err(|e| OverstoryError::Internal(e.to_string()))?;
        if active.len() as u32 >= config.max_concurrent {
            return Err(OverstoryError::agent(
                &req.name,
                format!(
                    "concurrency limit reached ({} active, max {})",
                    active.len(),
                    config.max_concurrent
                ),
            ));
        }
        if active.iter().any(|s| s.agent_name == req.name) {
            return Err(OverstoryError::agent(
                &req.name,
                format!("agent name '{}' already in use", req.name),
            ));
        }

        // 9. Stagger
        let delay = calculate_stagger_delay(config.stagger_delay_ms, &active, self.clock.now_ms());
        if delay > 0 {
            tracing::debug!(agent = %req.name, delay_ms = delay, "stagger delay");
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        // 10. The work item must be workable
        if config.tracker_enabled {
            let bead = self
                .tracker
                .get_bead(&req.bead_id)
                .await
                .map_err(|e| OverstoryError::agent(&req.name, e.to_string()))?;
            if !bead.is_workable() {
                return Err(OverstoryError::agent(
                    &req.name,
                    format!("bead {} is '{}', not workable", bead.id, bead.status),
                ));
            }
        }

        // 11. Working copy
        let worktree_path = self.dir.worktree_path(&req.name);
        let branch = branch_name(&req.name, &req.bead_id);
        self.worktree
            .add(
                self.dir.project_root(),
                &worktree_path,
                &branch,
                &config.canonical_branch,
            )
            .await
            .map_err(|e| OverstoryError::agent(&req.name, e.to_string()))?;

        // 12-13. Overlay and hooks. Failure leaves no orphan worktree.
        let prepared = materialize::materialize_overlay(
            &self.dir,
            &worktree_path,
            &cap_def,
            &OverlayContext {
                agent_name: &req.name,
                capability: req.capability.as_str(),
                bead_id: &req.bead_id,
                parent_agent: req.parent_agent.as_deref(),
                spec_path: spec_path.as_deref(),
                files: &req.files,
            },
        )
        .map_err(|e| {
            OverstoryError::agent(&req.name, format!("overlay materialization failed: {}", e))
        })
        .and_then(|_| {
            materialize::deploy_hooks(&self.dir, &worktree_path, &req.name).map_err(|e| {
                OverstoryError::agent(&req.name, format!("hook deployment failed: {}", e))
            })
        });
        if let Err(e) = prepared {
            self.cleanup_worktree(&worktree_path).await;
            return Err(e);
        }

        if config.tracker_enabled {
            quiet("bead-claim", self.tracker.claim(&req.bead_id, &req.name)).await;
        }

        // 15. Terminal session
        let tmux_session = mux_session_name(&config.project_name, &req.name);
        let runner_cmd = format!("{} --model {}", config.runner_command, cap_def.model);
        let env = vec![
            ("OVERSTORY_AGENT_NAME".to_string(), req.name.clone()),
            (
                "OVERSTORY_WORKTREE_PATH".to_string(),
                worktree_path.display().to_string(),
            ),
        ];
        if let Err(e) = self
            .mux
            .create(&tmux_session, &worktree_path, &runner_cmd, &env)
            .await
        {
            self.cleanup_worktree(&worktree_path).await;
            return Err(OverstoryError::agent(&req.name, e.to_string()));
        }
        let pid = self.mux.pane_pid(&tmux_session).await.ok().flatten();

        // 16. Register the row before the beacon
        let now = self.clock.now_rfc3339();
        let session = AgentSession {
            id: self.ids.next(),
            agent_name: req.name.clone(),
            capability: req.capability,
            worktree_path: worktree_path.display().to_string(),
            branch_name: branch,
            bead_id: req.bead_id.clone(),
            tmux_session: tmux_session.clone(),
            state: SessionState::Booting,
            pid,
            parent_agent: req.parent_agent.clone(),
            depth: req.depth,
            run_id: Some(run_id.clone()),
            started_at: now.clone(),
            last_activity: now,
            stalled_since: None,
            escalation_level: 0,
        };
        if let Err(e) = self.sessions.upsert(&session) {
            quiet("mux-rollback", self.mux.kill(&tmux_session)).await;
            self.cleanup_worktree(&worktree_path).await;
            return Err(OverstoryError::Internal(e.to_string()));
        }
        best_effort("identity", || {
            materialize::write_identity(&self.dir, &session)
        });

        // 17. Count the agent into the run
        best_effort("run-count", || {
            self.sessions.increment_agent_count(&run_id)
        });

        // 18. Wait for the TUI, then beacon
        if !beacon::wait_for_pane(&self.mux, &tmux_session, &self.timings).await {
            tracing::warn!(agent = %req.name, "pane never rendered; sending beacon anyway");
        }
        let text = beacon::worker_beacon(&req.name, req.capability.as_str(), &req.bead_id);
        if let Err(e) = beacon::deliver(&self.mux, &tmux_session, &text, &self.timings).await {
            // The row exists; supervision will zombie the session if it died
            tracing::warn!(agent = %req.name, error = %e, "beacon delivery failed");
        }

        tracing::info!(agent = %req.name, session = %tmux_session, run = %run_id, "agent spawned");
        Ok(session)
    }

    /// Start a coordinator or monitor at the project root.
    pub async fn start_persistent(
        &self,
        capability: Capability,
    ) -> Result<AgentSession, OverstoryError> {
        if !capability.is_persistent() {
            return Err(OverstoryError::validation(format!(
                "capability '{}' is not persistent",
                capability
            )));
        }
        let name = capability.as_str().to_string();

        if (self.root_probe)() {
            return Err(OverstoryError::agent(
                &name,
                "refusing to start as root; the runner would reject its permissions",
            ));
        }

        let config = Config::load(&self.dir.config_yaml())?;
        let manifest = CapabilityManifest::load(&self.dir.manifest_path())?;

        if capability == Capability::Monitor && !config.tier2_enabled {
            return Err(OverstoryError::agent(
                &name,
                "tier-2 monitoring is disabled (set tier2Enabled in config.yaml)",
            ));
        }

        let Some(cap_def) = manifest.get(capability).cloned() else {
            return Err(OverstoryError::validation(format!(
                "capability '{}' is not defined in the agent manifest",
                capability
            )));
        };

        if let Ok(Some(existing)) = self.sessions.get_by_name(&name) {
            if existing.state.is_live() {
                return Err(OverstoryError::agent(
                    &name,
                    format!("{} is already running", name),
                ));
            }
        }

        let project_root = self.dir.project_root().to_path_buf();
        materialize::materialize_overlay(
            &self.dir,
            &project_root,
            &cap_def,
            &OverlayContext {
                agent_name: &name,
                capability: capability.as_str(),
                bead_id: "",
                parent_agent: None,
                spec_path: None,
                files: &[],
            },
        )
        .map_err(|e| {
            OverstoryError::agent(&name, format!("overlay materialization failed: {}", e))
        })?;
        // Root-deployed hooks rely on the OVERSTORY_AGENT_NAME guard
        materialize::deploy_hooks(&self.dir, &project_root, &name)
            .map_err(|e| OverstoryError::agent(&name, format!("hook deployment failed: {}", e)))?;

        let tmux_session = mux_session_name(&config.project_name, &name);
        let runner_cmd = format!("{} --model {}", config.runner_command, cap_def.model);
        let env = vec![
            ("OVERSTORY_AGENT_NAME".to_string(), name.clone()),
            (
                "OVERSTORY_WORKTREE_PATH".to_string(),
                project_root.display().to_string(),
            ),
        ];
        self.mux
            .create(&tmux_session, &project_root, &runner_cmd, &env)
            .await
            .map_err(|e| OverstoryError::agent(&name, e.to_string()))?;
        let pid = self.mux.pane_pid(&tmux_session).await.ok().flatten();

        let now = self.clock.now_rfc3339();
        let session = AgentSession {
            id: self.ids.next(),
            agent_name: name.clone(),
            capability,
            worktree_path: project_root.display().to_string(),
            branch_name: config.canonical_branch.clone(),
            bead_id: String::new(),
            tmux_session: tmux_session.clone(),
            state: SessionState::Booting,
            pid,
            parent_agent: None,
            depth: 0,
            run_id: None,
            started_at: now.clone(),
            last_activity: now,
            stalled_since: None,
            escalation_level: 0,
        };
        self.sessions
            .upsert(&session)
            .map_err(|e| OverstoryError::Internal(e.to_string()))?;
        best_effort("identity", || {
            materialize::write_identity(&self.dir, &session)
        });

        if !beacon::wait_for_pane(&self.mux, &tmux_session, &self.timings).await {
            tracing::warn!(agent = %name, "pane never rendered; sending beacon anyway");
        }
        let text = beacon::persistent_beacon(&name, capability.as_str());
        if let Err(e) = beacon::deliver(&self.mux, &tmux_session, &text, &self.timings).await {
            tracing::warn!(agent = %name, error = %e, "beacon delivery failed");
        }

        tracing::info!(agent = %name, session = %tmux_session, "persistent agent started");
        Ok(session)
    }

    /// Stop a persistent agent: process-tree kill, mux kill, complete the
    /// session, and (for the coordinator) close out the active run.
    pub async fn stop_persistent(&self, capability: Capability) -> Result<(), OverstoryError> {
        if !capability.is_persistent() {
            return Err(OverstoryError::validation(format!(
                "capability '{}' is not persistent",
                capability
            )));
        }
        let name = capability.as_str();
        let session = self
            .sessions
            .get_by_name(name)
            .map_err(|e| OverstoryError::Internal(e.to_string()))?
            .filter(|s| s.state.is_live())
            .ok_or_else(|| OverstoryError::agent(name, format!("no active {} session", name)))?;

        if let Ok(Some(pid)) = self.mux.pane_pid(&session.tmux_session).await {
            self.proc
                .kill_tree(pid, ovs_adapters::proc::DEFAULT_GRACE)
                .await;
        } else if let Some(pid) = session.pid {
            self.proc
                .kill_tree(pid, ovs_adapters::proc::DEFAULT_GRACE)
                .await;
        }
        quiet("mux-kill", self.mux.kill(&session.tmux_session)).await;

        self.sessions
            .update_state(name, SessionState::Completed)
            .map_err(|e| OverstoryError::Internal(e.to_string()))?;

        if capability == Capability::Coordinator {
            if let Some(run_id) = self.read_current_run() {
                best_effort("complete-run", || {
                    self.sessions
                        .complete_run(&run_id, RunStatus::Completed, &self.clock.now_rfc3339())
                });
                let _ = std::fs::remove_file(self.dir.current_run_file());
            }
        }

        tracing::info!(agent = name, "persistent agent stopped");
        Ok(())
    }

    /// Read `current-run.txt`; create a run row and the file when absent.
    fn resolve_run_id(&self) -> Result<String, OverstoryError> {
        if let Some(existing) = self.read_current_run() {
            return Ok(existing);
        }

        let run_id = self.ids.next();
        let run = Run {
            id: run_id.clone(),
            started_at: self.clock.now_rfc3339(),
            completed_at: None,
            agent_count: 0,
            coordinator_session_id: self
                .sessions
                .get_by_name(Capability::Coordinator.as_str())
                .ok()
                .flatten()
                .filter(|s| s.state.is_live())
                .map(|s| s.id),
            status: RunStatus::Active,
        };
        self.sessions
            .create_run(&run)
            .map_err(|e| OverstoryError::Internal(e.to_string()))?;

        // Atomic write: temp file + rename, so a concurrent reader never
        // sees a torn id
        let target = self.dir.current_run_file();
        let tmp = target.with_extension("txt.tmp");
        std::fs::write(&tmp, &run_id)
            .and_then(|()| std::fs::rename(&tmp, &target))
            .map_err(|e| OverstoryError::Internal(format!("cannot write current-run.txt: {}", e)))?;

        Ok(run_id)
    }

    fn read_current_run(&self) -> Option<String> {
        std::fs::read_to_string(self.dir.current_run_file())
            .ok()
            .map(|content| content.trim().to_string())
            .filter(|id| !id.is_empty())
    }

    async fn cleanup_worktree(&self, path: &std::path::Path) {
        quiet(
            "worktree-cleanup",
            self.worktree.remove(self.dir.project_root(), path),
        )
        .await;
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
