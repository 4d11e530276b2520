// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook-intake specs: drive `ovs log` the way the AI runner's hooks do.

use assert_cmd::Command;
use tempfile::TempDir;

fn ovs_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ovs").unwrap();
    cmd.current_dir(dir.path());
    cmd.env("OVERSTORY_ALLOW_ROOT", "1");
    cmd
}

fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir_all(tmp.path().join(".overstory")).unwrap();
    tmp
}

#[test]
fn tool_start_and_end_round_trip_through_stdin() {
    let project = project();

    ovs_in(&project)
        .args(["log", "tool-start", "--agent", "A", "--stdin"])
        .write_stdin(r#"{"tool_name": "Read", "tool_input": {"file_path": "/x"}}"#)
        .assert()
        .success();

    ovs_in(&project)
        .args(["log", "tool-end", "--agent", "A", "--stdin"])
        .write_stdin(r#"{"tool_name": "Read", "tool_input": {"file_path": "/x"}}"#)
        .assert()
        .success();

    // The event store was created and populated
    assert!(project.path().join(".overstory/events.db").exists());
    // Legacy ndjson log exists for the agent
    let logs = project.path().join(".overstory/logs/A");
    assert!(logs.is_dir());
}

#[test]
fn malformed_stdin_payload_does_not_break_the_hook() {
    let project = project();

    ovs_in(&project)
        .args(["log", "tool-start", "--agent", "A", "--stdin"])
        .write_stdin("not json")
        .assert()
        .success();
}

#[test]
fn legacy_flag_form_is_accepted() {
    let project = project();

    ovs_in(&project)
        .args(["log", "tool-end", "--agent", "A", "--tool-name", "Bash"])
        .assert()
        .success();
}

#[test]
fn session_end_for_unknown_agent_is_harmless() {
    let project = project();

    ovs_in(&project)
        .args(["log", "session-end", "--agent", "ghost", "--stdin"])
        .write_stdin("{}")
        .assert()
        .success();
}
