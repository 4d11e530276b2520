// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_root_is_dot_overstory() {
    let dir = ControlDir::new("/proj");
    assert_eq!(dir.root(), Path::new("/proj/.overstory"));
    assert_eq!(dir.project_root(), Path::new("/proj"));
}

#[test]
fn path_accessors() {
    let dir = ControlDir::new("/proj");
    assert_eq!(dir.sessions_db(), Path::new("/proj/.overstory/sessions.db"));
    assert_eq!(
        dir.worktree_path("L1"),
        Path::new("/proj/.overstory/worktrees/L1")
    );
    assert_eq!(
        dir.identity_path("L1"),
        Path::new("/proj/.overstory/agents/L1/identity.yaml")
    );
    assert_eq!(
        dir.pending_nudge_path("coordinator"),
        Path::new("/proj/.overstory/pending-nudges/coordinator.json")
    );
    assert_eq!(
        dir.last_snapshot_path("B1"),
        Path::new("/proj/.overstory/logs/B1/.last-snapshot")
    );
}

#[test]
fn ensure_layout_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = ControlDir::new(tmp.path());
    dir.ensure_layout().unwrap();
    dir.ensure_layout().unwrap();

    assert!(dir.worktrees_dir().is_dir());
    assert!(dir.agent_defs_dir().is_dir());
    assert!(dir.pending_nudges_dir().is_dir());
}
