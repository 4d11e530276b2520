// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use ovs_core::test_support::session_started_at;
use ovs_core::SessionState;
use yare::parameterized;

#[test]
fn zero_stagger_means_no_delay() {
    let sessions = vec![session_started_at("a", SessionState::Working, 1000)];
    assert_eq!(calculate_stagger_delay(0, &sessions, 1001), 0);
}

#[test]
fn empty_active_set_means_no_delay() {
    assert_eq!(calculate_stagger_delay(1000, &[], 5000), 0);
}

#[test]
fn delay_counts_down_from_most_recent_start() {
    let sessions = vec![
        session_started_at("old", SessionState::Working, 0),
        session_started_at("new", SessionState::Working, 800),
    ];
    // now=1000: most recent started 200ms ago, 800ms of the window remain
    assert_eq!(calculate_stagger_delay(1000, &sessions, 1000), 800);
}

#[test]
fn elapsed_window_means_no_delay() {
    let sessions = vec![session_started_at("a", SessionState::Working, 0)];
    assert_eq!(calculate_stagger_delay(1000, &sessions, 1000), 0);
    assert_eq!(calculate_stagger_delay(1000, &sessions, 5000), 0);
}

#[test]
fn terminal_sessions_do_not_gate_spawns() {
    let sessions = vec![
        session_started_at("done", SessionState::Completed, 900),
        session_started_at("dead", SessionState::Zombie, 950),
    ];
    assert_eq!(calculate_stagger_delay(1000, &sessions, 1000), 0);
}

#[parameterized(
    at_start = { 0, 1000 },
    mid_window = { 600, 400 },
    at_boundary = { 1000, 0 },
)]
fn full_window_progression(elapsed: u64, expected: u64) {
    let sessions = vec![session_started_at("a", SessionState::Booting, 10_000)];
    assert_eq!(
        calculate_stagger_delay(1000, &sessions, 10_000 + elapsed),
        expected
    );
}
