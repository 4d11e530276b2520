// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;

fn ovs() -> Command {
    Command::cargo_bin("ovs").unwrap()
}

#[test]
fn top_level_help_lists_core_commands() {
    let assert = ovs().arg("--help").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    for command in [
        "sling",
        "coordinator",
        "monitor",
        "watch",
        "nudge",
        "status",
        "log",
        "clean",
        "doctor",
    ] {
        assert!(out.contains(command), "help is missing {}", command);
    }
}

#[test]
fn sling_help_documents_required_flags() {
    let assert = ovs().args(["sling", "--help"]).assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("--capability"));
    assert!(out.contains("--name"));
    assert!(out.contains("--force-hierarchy"));
}

#[test]
fn short_h_works() {
    ovs().arg("-h").assert().success();
}
