// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn create_records_call_and_session_is_alive() {
    let fake = FakeMuxAdapter::new();
    fake.create(
        "overstory-p-a",
        Path::new("/tmp"),
        "claude",
        &[("K".to_string(), "V".to_string())],
    )
    .await
    .unwrap();

    assert!(fake.has_session("overstory-p-a").await.unwrap());
    assert!(fake.pane_pid("overstory-p-a").await.unwrap().is_some());
    assert!(matches!(fake.calls()[0], MuxCall::Create { .. }));
}

#[tokio::test]
async fn scripted_create_failure() {
    let fake = FakeMuxAdapter::new();
    fake.fail_next_create();

    assert!(fake
        .create("overstory-p-a", Path::new("/tmp"), "claude", &[])
        .await
        .is_err());
    // Only the next call fails
    fake.create("overstory-p-b", Path::new("/tmp"), "claude", &[])
        .await
        .unwrap();
}

#[tokio::test]
async fn send_to_dead_session_errors() {
    let fake = FakeMuxAdapter::new();
    fake.add_session("overstory-p-a", false, None);

    assert!(fake.send_keys("overstory-p-a", "hi").await.is_err());
    assert!(fake.send_enter("overstory-p-a").await.is_err());
    assert!(fake.capture("overstory-p-a").await.is_err());
}

#[tokio::test]
async fn kill_pane_simulates_death_without_removing_session() {
    let fake = FakeMuxAdapter::new();
    fake.add_session("overstory-p-a", true, Some(1234));

    fake.kill_pane("overstory-p-a");

    assert!(!fake.is_alive("overstory-p-a"));
    assert_eq!(fake.pane_pid("overstory-p-a").await.unwrap(), None);
}

#[tokio::test]
async fn sent_keys_and_enter_count_helpers() {
    let fake = FakeMuxAdapter::new();
    fake.add_session("overstory-p-a", true, Some(1));

    fake.send_keys("overstory-p-a", "beacon").await.unwrap();
    fake.send_enter("overstory-p-a").await.unwrap();
    fake.send_enter("overstory-p-a").await.unwrap();

    assert_eq!(fake.sent_keys("overstory-p-a"), vec!["beacon"]);
    assert_eq!(fake.enter_count("overstory-p-a"), 2);
}
