// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

fn entry(branch: &str) -> MergeQueueEntry {
    MergeQueueEntry {
        branch_name: branch.to_string(),
        bead_id: "bead-1".to_string(),
        agent_name: "B1".to_string(),
        files_modified: vec!["src/lib.rs".to_string(), "src/main.rs".to_string()],
        status: MergeStatus::Pending,
        enqueued_at: "2026-01-01T00:00:00.000Z".to_string(),
        resolved_tier: None,
    }
}

#[test]
fn enqueue_and_list_pending() {
    let dir = TempDir::new().unwrap();
    let store = MergeQueueStore::open(&dir.path().join("merge-queue.db")).unwrap();

    store.enqueue(&entry("overstory/B1/bead-1")).unwrap();
    store.enqueue(&entry("overstory/B2/bead-2")).unwrap();

    let pending = store.pending().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].files_modified.len(), 2);
}

#[test]
fn status_updates_move_entries_out_of_pending() {
    let dir = TempDir::new().unwrap();
    let store = MergeQueueStore::open(&dir.path().join("merge-queue.db")).unwrap();
    store.enqueue(&entry("overstory/B1/bead-1")).unwrap();

    store
        .update_status("overstory/B1/bead-1", MergeStatus::Merged, Some("tier-1"))
        .unwrap();

    assert!(store.pending().unwrap().is_empty());
    let all = store.all().unwrap();
    assert_eq!(all[0].status, MergeStatus::Merged);
    assert_eq!(all[0].resolved_tier.as_deref(), Some("tier-1"));
}

#[test]
fn re_enqueue_replaces_existing_branch_entry() {
    let dir = TempDir::new().unwrap();
    let store = MergeQueueStore::open(&dir.path().join("merge-queue.db")).unwrap();

    store.enqueue(&entry("overstory/B1/bead-1")).unwrap();
    let mut again = entry("overstory/B1/bead-1");
    again.files_modified = vec!["other.rs".to_string()];
    store.enqueue(&again).unwrap();

    let all = store.all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].files_modified, vec!["other.rs"]);
}
