// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_adapters::{FakeMuxAdapter, FakeTracker, FakeWorktree};
use ovs_core::FakeClock;
use ovs_store::SessionStore;
use std::time::Instant;
use tempfile::TempDir;

struct Fixture {
    _tmp: TempDir,
    dir: ControlDir,
    sessions: SessionStore,
    mux: FakeMuxAdapter,
    worktree: FakeWorktree,
    tracker: FakeTracker,
    clock: FakeClock,
}

fn fast_timings() -> BeaconTimings {
    BeaconTimings {
        pane_wait: Duration::from_millis(50),
        poll_interval: Duration::from_millis(5),
        enter_delay: Duration::from_millis(1),
    }
}

fn fixture() -> Fixture {
    fixture_with_config(
        "projectName: P\nmaxConcurrent: 3\nstaggerDelayMs: 0\nmaxDepth: 2\n",
    )
}

fn fixture_with_config(config_yaml: &str) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let dir = ControlDir::new(tmp.path());
    dir.ensure_layout().unwrap();
    std::fs::write(dir.config_yaml(), config_yaml).unwrap();
    std::fs::write(
        dir.manifest_path(),
        r#"{
            "coordinator": {"file": "coordinator.md", "model": "opus"},
            "monitor": {"file": "monitor.md", "model": "sonnet"},
            "lead": {"file": "lead.md", "model": "opus", "can_spawn": ["builder", "scout"]},
            "scout": {"file": "scout.md", "model": "haiku"},
            "builder": {"file": "builder.md", "model": "sonnet"}
        }"#,
    )
    .unwrap();
    for def in ["coordinator", "monitor", "lead", "scout", "builder"] {
        std::fs::write(
            dir.agent_defs_dir().join(format!("{}.md", def)),
            format!("# {} instructions\nDo the work.\n", def),
        )
        .unwrap();
    }

    let (sessions, _) =
        SessionStore::open(&dir.sessions_db(), &dir.legacy_sessions_json()).unwrap();
    let tracker = FakeTracker::new();
    tracker.add_bead("bead-42", "open");
    tracker.add_bead("bead-43", "open");
    tracker.add_bead("bead-44", "open");

    Fixture {
        _tmp: tmp,
        dir,
        sessions,
        mux: FakeMuxAdapter::new(),
        worktree: FakeWorktree::new(),
        tracker,
        clock: FakeClock::new(2_000_000_000_000),
    }
}

type TestLifecycle = Lifecycle<FakeMuxAdapter, FakeWorktree, FakeTracker, FakeClock>;

fn lifecycle(f: &Fixture) -> TestLifecycle {
    Lifecycle::new(
        f.dir.clone(),
        f.sessions.clone(),
        f.mux.clone(),
        f.worktree.clone(),
        f.tracker.clone(),
        f.clock.clone(),
    )
    .with_timings(fast_timings())
    .with_root_probe(|| false)
}

fn lead_request(name: &str, bead: &str) -> SpawnRequest {
    SpawnRequest {
        bead_id: bead.to_string(),
        capability: Capability::Lead,
        name: name.to_string(),
        spec_path: None,
        files: Vec::new(),
        parent_agent: None,
        depth: 0,
        force_hierarchy: false,
    }
}

// ── E1: happy spawn ─────────────────────────────────────────────────────────

#[tokio::test]
async fn happy_spawn_creates_worktree_branch_row_session_and_run() {
    let f = fixture();
    let session = lifecycle(&f).spawn(lead_request("L1", "bead-42")).await.unwrap();

    // Worktree on the agent's branch
    let worktree = f.dir.worktree_path("L1");
    assert!(worktree.is_dir());
    assert_eq!(
        f.worktree.added(),
        vec![(worktree.clone(), "overstory/L1/bead-42".to_string())]
    );

    // Session row
    assert_eq!(session.state, SessionState::Booting);
    assert_eq!(session.depth, 0);
    assert_eq!(session.parent_agent, None);
    assert_eq!(session.tmux_session, "overstory-P-L1");
    let row = f.sessions.get_by_name("L1").unwrap().unwrap();
    assert_eq!(row.branch_name, "overstory/L1/bead-42");

    // Mux session alive, with identity env
    assert!(f.mux.is_alive("overstory-P-L1"));
    let calls = f.mux.calls();
    let ovs_adapters::MuxCall::Create { env, cmd, .. } = &calls[0] else {
        panic!("first call should be create");
    };
    assert!(env.contains(&("OVERSTORY_AGENT_NAME".to_string(), "L1".to_string())));
    assert!(cmd.contains("--model opus"));

    // Run materialized
    let run_id = std::fs::read_to_string(f.dir.current_run_file()).unwrap();
    assert_eq!(session.run_id.as_deref(), Some(run_id.trim()));
    let run = f.sessions.get_run(run_id.trim()).unwrap().unwrap();
    assert_eq!(run.agent_count, 1);

    // Beacon then two enters
    let sent = f.mux.sent_keys("overstory-P-L1");
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("bead-42"));
    assert_eq!(f.mux.enter_count("overstory-P-L1"), 2);

    // Overlay and hooks landed in the worktree
    assert!(worktree.join(".overstory/OVERLAY.md").exists());
    assert!(worktree.join(".claude/settings.json").exists());

    // Identity persisted
    assert!(f.dir.identity_path("L1").exists());
}

#[tokio::test]
async fn spawned_overlay_carries_assignment_context() {
    let f = fixture();
    let spec = f.dir.root().join("spec.md");
    std::fs::write(&spec, "build the thing").unwrap();

    let mut req = lead_request("L1", "bead-42");
    req.files = vec!["src/a.rs".to_string()];
    req.spec_path = Some(spec.clone());
    lifecycle(&f).spawn(req).await.unwrap();

    let overlay =
        std::fs::read_to_string(f.dir.worktree_path("L1").join(".overstory/OVERLAY.md")).unwrap();
    assert!(overlay.contains("# lead instructions"));
    assert!(overlay.contains("bead-42"));
    assert!(overlay.contains("src/a.rs"));
}

// ── Validation and gates ────────────────────────────────────────────────────

#[tokio::test]
async fn empty_name_and_bead_are_validation_errors() {
    let f = fixture();
    let lc = lifecycle(&f);

    let err = lc.spawn(lead_request("", "bead-42")).await.unwrap_err();
    assert!(matches!(err, OverstoryError::Validation(_)));
    assert!(err.to_string().contains("name"));

    let err = lc.spawn(lead_request("L1", "")).await.unwrap_err();
    assert!(err.to_string().contains("beadId"));
}

#[tokio::test]
async fn missing_spec_path_is_a_validation_error() {
    let f = fixture();
    let mut req = lead_request("L1", "bead-42");
    req.spec_path = Some(f.dir.root().join("nope.md"));

    let err = lifecycle(&f).spawn(req).await.unwrap_err();
    assert!(matches!(err, OverstoryError::Validation(_)));
    assert!(err.to_string().contains("spec"));
}

#[tokio::test]
async fn root_identity_is_rejected() {
    let f = fixture();
    let lc = lifecycle(&f).with_root_probe(|| true);

    let err = lc.spawn(lead_request("L1", "bead-42")).await.unwrap_err();
    assert!(matches!(err, OverstoryError::Agent { .. }));
    assert!(err.to_string().contains("root"));
}

// ── E2: hierarchy gate ──────────────────────────────────────────────────────

#[tokio::test]
async fn parentless_non_lead_is_a_hierarchy_error_with_no_side_effects() {
    let f = fixture();
    let mut req = lead_request("B1", "bead-43");
    req.capability = Capability::Builder;

    let err = lifecycle(&f).spawn(req).await.unwrap_err();

    assert!(matches!(err, OverstoryError::Hierarchy { .. }));
    assert!(err.to_string().contains("lead"));
    // No worktree, no session row
    assert!(f.worktree.added().is_empty());
    assert!(f.sessions.get_by_name("B1").unwrap().is_none());
}

#[tokio::test]
async fn any_capability_with_parent_is_accepted() {
    let f = fixture();
    let mut req = lead_request("B1", "bead-43");
    req.capability = Capability::Builder;
    req.parent_agent = Some("L1".to_string());
    req.depth = 1;

    lifecycle(&f).spawn(req).await.unwrap();
    assert!(f.sessions.get_by_name("B1").unwrap().is_some());
}

#[tokio::test]
async fn force_hierarchy_overrides_the_gate() {
    let f = fixture();
    let mut req = lead_request("B1", "bead-43");
    req.capability = Capability::Builder;
    req.force_hierarchy = true;

    lifecycle(&f).spawn(req).await.unwrap();
}

#[tokio::test]
async fn depth_beyond_max_is_rejected() {
    let f = fixture();
    let mut req = lead_request("S1", "bead-43");
    req.capability = Capability::Scout;
    req.parent_agent = Some("L1".to_string());
    req.depth = 3; // maxDepth is 2

    let err = lifecycle(&f).spawn(req).await.unwrap_err();
    assert!(err.to_string().contains("maxDepth"));
}

#[tokio::test]
async fn persistent_capability_cannot_be_slung() {
    let f = fixture();
    let mut req = lead_request("C1", "bead-43");
    req.capability = Capability::Coordinator;

    let err = lifecycle(&f).spawn(req).await.unwrap_err();
    assert!(matches!(err, OverstoryError::Validation(_)));
}

#[tokio::test]
async fn undefined_capability_is_rejected_by_manifest() {
    let f = fixture();
    let mut req = lead_request("M1", "bead-43");
    req.capability = Capability::Merger; // not in the test manifest
    req.parent_agent = Some("L1".to_string());

    let err = lifecycle(&f).spawn(req).await.unwrap_err();
    assert!(err.to_string().contains("manifest"));
}

// ── E3: name collision ──────────────────────────────────────────────────────

#[tokio::test]
async fn live_name_collision_is_an_agent_error() {
    let f = fixture();
    let lc = lifecycle(&f);
    lc.spawn(lead_request("L1", "bead-42")).await.unwrap();

    let err = lc.spawn(lead_request("L1", "bead-44")).await.unwrap_err();

    assert!(matches!(err, OverstoryError::Agent { .. }));
    assert!(err.to_string().contains("L1"));
    assert!(err.to_string().contains("already in use"));
}

#[tokio::test]
async fn completed_name_can_be_reused() {
    let f = fixture();
    let lc = lifecycle(&f);
    lc.spawn(lead_request("L1", "bead-42")).await.unwrap();
    f.sessions
        .update_state("L1", SessionState::Completed)
        .unwrap();
    // The worktree from the finished life is gone
    f.worktree.remove(f.dir.project_root(), &f.dir.worktree_path("L1"))
        .await
        .unwrap();

    lc.spawn(lead_request("L1", "bead-44")).await.unwrap();
}

#[tokio::test]
async fn concurrency_limit_is_enforced() {
    let f = fixture();
    let lc = lifecycle(&f);
    for (i, bead) in ["bead-42", "bead-43", "bead-44"].iter().enumerate() {
        lc.spawn(lead_request(&format!("L{}", i), bead)).await.unwrap();
    }
    f.tracker.add_bead("bead-45", "open");

    let err = lc.spawn(lead_request("L9", "bead-45")).await.unwrap_err();
    assert!(err.to_string().contains("concurrency limit"));
}

// ── Tracker gate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn unworkable_bead_is_refused() {
    let f = fixture();
    f.tracker.add_bead("bead-closed", "closed");

    let err = lifecycle(&f)
        .spawn(lead_request("L1", "bead-closed"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not workable"));
    assert!(f.worktree.added().is_empty());
}

#[tokio::test]
async fn workable_bead_is_claimed_for_the_agent() {
    let f = fixture();
    lifecycle(&f).spawn(lead_request("L1", "bead-42")).await.unwrap();

    assert_eq!(
        f.tracker.claims(),
        vec![("bead-42".to_string(), "L1".to_string())]
    );
}

// ── Property 1: spawn atomicity ─────────────────────────────────────────────

#[tokio::test]
async fn overlay_failure_removes_the_worktree() {
    let f = fixture();
    // Overlay fails because the template is missing
    std::fs::remove_file(f.dir.agent_defs_dir().join("lead.md")).unwrap();

    let err = lifecycle(&f).spawn(lead_request("L1", "bead-42")).await.unwrap_err();

    assert!(err.to_string().contains("overlay"));
    assert_eq!(f.worktree.removed(), vec![f.dir.worktree_path("L1")]);
    assert!(!f.dir.worktree_path("L1").exists());
    assert!(f.sessions.get_by_name("L1").unwrap().is_none());
}

#[tokio::test]
async fn mux_failure_removes_the_worktree_and_leaves_no_row() {
    let f = fixture();
    f.mux.fail_next_create();

    let err = lifecycle(&f).spawn(lead_request("L1", "bead-42")).await.unwrap_err();

    assert!(matches!(err, OverstoryError::Agent { .. }));
    assert_eq!(f.worktree.removed(), vec![f.dir.worktree_path("L1")]);
    assert!(f.sessions.get_by_name("L1").unwrap().is_none());
}

// ── E4: stagger ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_spawn_waits_out_the_stagger_window() {
    let f = fixture_with_config(
        "projectName: P\nmaxConcurrent: 5\nstaggerDelayMs: 300\nmaxDepth: 2\n",
    );
    let lc = lifecycle(&f);

    lc.spawn(lead_request("N1", "bead-42")).await.unwrap();
    // The registry row for N1 carries started_at = clock now; a second
    // spawn inside the window must sleep the remainder.
    let started = Instant::now();
    lc.spawn(lead_request("N2", "bead-43")).await.unwrap();

    assert!(
        started.elapsed() >= Duration::from_millis(290),
        "second spawn returned after {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn stagger_zero_spawns_back_to_back() {
    let f = fixture();
    let lc = lifecycle(&f);

    let started = Instant::now();
    lc.spawn(lead_request("N1", "bead-42")).await.unwrap();
    lc.spawn(lead_request("N2", "bead-43")).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

// ── Run resolution ──────────────────────────────────────────────────────────

#[tokio::test]
async fn spawns_join_the_existing_run() {
    let f = fixture();
    let lc = lifecycle(&f);

    let first = lc.spawn(lead_request("L1", "bead-42")).await.unwrap();
    let second = lc.spawn(lead_request("L2", "bead-43")).await.unwrap();

    assert_eq!(first.run_id, second.run_id);
    let run = f
        .sessions
        .get_run(first.run_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(run.agent_count, 2);
}

// ── Persistent agents ───────────────────────────────────────────────────────

#[tokio::test]
async fn coordinator_starts_at_project_root_without_worktree() {
    let f = fixture();
    let session = lifecycle(&f)
        .start_persistent(Capability::Coordinator)
        .await
        .unwrap();

    assert_eq!(session.agent_name, "coordinator");
    assert_eq!(session.tmux_session, "overstory-P-coordinator");
    assert_eq!(session.run_id, None);
    assert_eq!(session.bead_id, "");
    assert!(f.worktree.added().is_empty());
    // Hooks and overlay deployed at the project root
    assert!(f.dir.project_root().join(".claude/settings.json").exists());
    assert!(f.dir.project_root().join(".overstory/OVERLAY.md").exists());
    // Hook commands carry the activation guard
    let settings =
        std::fs::read_to_string(f.dir.project_root().join(".claude/settings.json")).unwrap();
    assert!(settings.contains("OVERSTORY_AGENT_NAME"));
}

#[tokio::test]
async fn monitor_requires_tier2() {
    let f = fixture();
    let err = lifecycle(&f)
        .start_persistent(Capability::Monitor)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("tier-2"));

    let f2 = fixture_with_config(
        "projectName: P\nmaxConcurrent: 3\nstaggerDelayMs: 0\nmaxDepth: 2\ntier2Enabled: true\n",
    );
    lifecycle(&f2)
        .start_persistent(Capability::Monitor)
        .await
        .unwrap();
}

#[tokio::test]
async fn double_coordinator_start_is_refused() {
    let f = fixture();
    let lc = lifecycle(&f);
    lc.start_persistent(Capability::Coordinator).await.unwrap();

    let err = lc.start_persistent(Capability::Coordinator).await.unwrap_err();
    assert!(err.to_string().contains("already running"));
}

#[tokio::test]
async fn worker_capability_is_not_persistent() {
    let f = fixture();
    let err = lifecycle(&f)
        .start_persistent(Capability::Builder)
        .await
        .unwrap_err();
    assert!(matches!(err, OverstoryError::Validation(_)));
}

#[tokio::test]
async fn coordinator_stop_completes_session_and_run() {
    let f = fixture();
    let lc = lifecycle(&f);
    lc.start_persistent(Capability::Coordinator).await.unwrap();
    // A worker spawn created the active run
    lc.spawn(lead_request("L1", "bead-42")).await.unwrap();
    let run_id = std::fs::read_to_string(f.dir.current_run_file()).unwrap();

    lc.stop_persistent(Capability::Coordinator).await.unwrap();

    let row = f.sessions.get_by_name("coordinator").unwrap().unwrap();
    assert_eq!(row.state, SessionState::Completed);
    assert!(!f.mux.is_alive("overstory-P-coordinator"));
    assert!(!f.dir.current_run_file().exists());
    let run = f.sessions.get_run(run_id.trim()).unwrap().unwrap();
    assert_eq!(run.status, ovs_core::RunStatus::Completed);
    assert!(run.completed_at.is_some());
}

#[tokio::test]
async fn stop_without_active_session_is_an_agent_error() {
    let f = fixture();
    let err = lifecycle(&f)
        .stop_persistent(Capability::Coordinator)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("no active"));
}

#[tokio::test]
async fn run_created_after_coordinator_references_its_session() {
    let f = fixture();
    let lc = lifecycle(&f);
    let coordinator = lc.start_persistent(Capability::Coordinator).await.unwrap();

    let worker = lc.spawn(lead_request("L1", "bead-42")).await.unwrap();

    let run = f
        .sessions
        .get_run(worker.run_id.as_deref().unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(run.coordinator_session_id, Some(coordinator.id));
}
