// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::CommandFactory;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn sling_parses_full_flag_set() {
    let cli = Cli::try_parse_from([
        "ovs",
        "sling",
        "bead-42",
        "--capability",
        "builder",
        "--name",
        "B1",
        "--parent",
        "L1",
        "--depth",
        "1",
        "--files",
        "a.rs,b.rs",
        "--force-hierarchy",
    ])
    .unwrap();

    let Commands::Sling(args) = cli.command else {
        panic!("expected sling");
    };
    assert_eq!(args.bead_id, "bead-42");
    assert_eq!(args.capability, ovs_core::Capability::Builder);
    assert_eq!(args.name, "B1");
    assert_eq!(args.parent.as_deref(), Some("L1"));
    assert_eq!(args.depth, 1);
    assert_eq!(args.files, vec!["a.rs", "b.rs"]);
    assert!(args.force_hierarchy);
}

#[test]
fn sling_rejects_unknown_capability() {
    assert!(Cli::try_parse_from([
        "ovs",
        "sling",
        "bead-42",
        "--capability",
        "architect",
        "--name",
        "A1",
    ])
    .is_err());
}

#[test]
fn json_flag_is_global() {
    let cli = Cli::try_parse_from(["ovs", "status", "--json"]).unwrap();
    assert!(cli.json);
    let cli = Cli::try_parse_from(["ovs", "--json", "status"]).unwrap();
    assert!(cli.json);
}

#[test]
fn coordinator_attach_flags_conflict() {
    assert!(Cli::try_parse_from([
        "ovs",
        "coordinator",
        "start",
        "--attach",
        "--no-attach"
    ])
    .is_err());
}

#[test]
fn exit_codes_follow_the_taxonomy() {
    let validation: anyhow::Error = OverstoryError::validation("bad").into();
    assert_eq!(exit_code(&validation), 1);

    let agent: anyhow::Error = OverstoryError::agent("L1", "collision").into();
    assert_eq!(exit_code(&agent), 2);

    let other = anyhow::anyhow!("something else");
    assert_eq!(exit_code(&other), 1);
}
