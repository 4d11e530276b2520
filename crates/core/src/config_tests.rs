// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("config.yaml")).unwrap();
    assert_eq!(config.max_concurrent, 8);
    assert_eq!(config.canonical_branch, "main");
    assert!(!config.tier2_enabled);
}

#[test]
fn partial_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(
        &path,
        "projectName: demo\nmaxConcurrent: 3\nstaggerDelayMs: 0\ntier2Enabled: true\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.project_name, "demo");
    assert_eq!(config.max_concurrent, 3);
    assert_eq!(config.stagger_delay_ms, 0);
    assert!(config.tier2_enabled);
    // Untouched fields keep their defaults
    assert_eq!(config.max_depth, 3);
}

#[test]
fn unparseable_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "maxConcurrent: [not a number").unwrap();

    assert!(matches!(
        Config::load(&path),
        Err(OverstoryError::Config(_))
    ));
}
