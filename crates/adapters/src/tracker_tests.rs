// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    open = { "open", true },
    in_progress = { "in_progress", true },
    closed = { "closed", false },
    blocked = { "blocked", false },
)]
fn workable_statuses(status: &str, workable: bool) {
    let bead = Bead {
        id: "bead-1".to_string(),
        status: status.to_string(),
        title: String::new(),
    };
    assert_eq!(bead.is_workable(), workable);
}

#[tokio::test]
async fn fake_returns_scripted_beads() {
    let fake = FakeTracker::new();
    fake.add_bead("bead-1", "open");

    let bead = fake.get_bead("bead-1").await.unwrap();
    assert_eq!(bead.status, "open");
    assert!(matches!(
        fake.get_bead("bead-2").await,
        Err(TrackerError::NotFound(_))
    ));
}

#[tokio::test]
async fn fake_records_claims() {
    let fake = FakeTracker::new();
    fake.add_bead("bead-1", "open");

    fake.claim("bead-1", "B1").await.unwrap();

    assert_eq!(fake.claims(), vec![("bead-1".to_string(), "B1".to_string())]);
}
