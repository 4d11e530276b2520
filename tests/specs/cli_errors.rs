// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use assert_cmd::Command;
use tempfile::TempDir;

fn ovs_in(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ovs").unwrap();
    cmd.current_dir(dir.path());
    // CI containers often run as root; the spawn gate must not mask the
    // behavior under test
    cmd.env("OVERSTORY_ALLOW_ROOT", "1");
    cmd
}

/// A project with config, manifest, and agent defs, but no live tooling.
fn seeded_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let ovs_dir = tmp.path().join(".overstory");
    std::fs::create_dir_all(ovs_dir.join("agent-defs")).unwrap();
    std::fs::write(
        ovs_dir.join("config.yaml"),
        "projectName: P\nmaxConcurrent: 3\nstaggerDelayMs: 0\nmaxDepth: 2\ntrackerEnabled: false\n",
    )
    .unwrap();
    std::fs::write(
        ovs_dir.join("agent-manifest.json"),
        r#"{
            "lead": {"file": "lead.md", "model": "opus"},
            "builder": {"file": "builder.md", "model": "sonnet"}
        }"#,
    )
    .unwrap();
    for def in ["lead", "builder"] {
        std::fs::write(
            ovs_dir.join(format!("agent-defs/{}.md", def)),
            "instructions\n",
        )
        .unwrap();
    }
    tmp
}

#[test]
fn parentless_builder_is_rejected_citing_lead() {
    let project = seeded_project();

    let assert = ovs_in(&project)
        .args(["sling", "bead-43", "--capability", "builder", "--name", "B1"])
        .assert()
        .failure();

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("lead"), "stderr was: {}", stderr);
    // No worktree, no session row
    assert!(!project.path().join(".overstory/worktrees/B1").exists());
}

#[test]
fn empty_name_is_a_validation_error() {
    let project = seeded_project();

    let assert = ovs_in(&project)
        .args(["sling", "bead-43", "--capability", "lead", "--name", ""])
        .assert()
        .failure()
        .code(1);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("name"));
}

#[test]
fn unknown_log_event_fails() {
    let project = seeded_project();
    ovs_in(&project)
        .args(["log", "tool-maybe", "--agent", "A"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn clean_without_selection_is_a_validation_error() {
    let project = seeded_project();
    ovs_in(&project).arg("clean").assert().failure().code(1);
}

#[test]
fn clean_all_on_fresh_project_succeeds() {
    let project = seeded_project();
    let assert = ovs_in(&project)
        .args(["clean", "--all"])
        .assert()
        .success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("Cleaned"));
}

#[test]
fn doctor_rejects_unknown_category() {
    let project = seeded_project();
    ovs_in(&project)
        .args(["doctor", "--category", "vibes"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn status_on_empty_project_reports_no_sessions() {
    let project = seeded_project();
    let assert = ovs_in(&project).arg("status").assert().success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("No sessions"));
}

#[test]
fn status_json_is_machine_readable() {
    let project = seeded_project();
    let assert = ovs_in(&project)
        .args(["status", "--json"])
        .assert()
        .success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert!(parsed.get("sessions").is_some());
    assert!(parsed.get("runs").is_some());
}

#[test]
fn monitor_start_without_tier2_is_refused() {
    let project = seeded_project();
    let assert = ovs_in(&project)
        .args(["monitor", "start", "--no-attach"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("tier-2"));
}

#[test]
fn coordinator_status_on_fresh_project_is_not_running() {
    let project = seeded_project();
    let assert = ovs_in(&project)
        .args(["coordinator", "status"])
        .assert()
        .success();
    let out = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert!(out.contains("not running"));
}
