// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs sling` - spawn a worker agent.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use clap::Args;
use ovs_core::Capability;
use ovs_engine::lifecycle::SpawnRequest;
use std::path::PathBuf;

#[derive(Args)]
pub struct SlingArgs {
    /// Work item to bind the agent to
    pub bead_id: String,

    /// Agent capability (lead, scout, builder, reviewer, merger)
    #[arg(long)]
    pub capability: Capability,

    /// Agent name, unique across the live fleet
    #[arg(long)]
    pub name: String,

    /// Name of the spawning agent
    #[arg(long)]
    pub parent: Option<String>,

    /// Hierarchy depth of the new agent
    #[arg(long, default_value_t = 0)]
    pub depth: u32,

    /// Spec document handed to the agent
    #[arg(long)]
    pub spec: Option<PathBuf>,

    /// Files in scope, comma separated
    #[arg(long, value_delimiter = ',')]
    pub files: Vec<String>,

    /// Bypass the parent/lead hierarchy rule
    #[arg(long)]
    pub force_hierarchy: bool,
}

pub async fn run(args: SlingArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    let session = ctx
        .lifecycle()
        .spawn(SpawnRequest {
            bead_id: args.bead_id,
            capability: args.capability,
            name: args.name,
            spec_path: args.spec,
            files: args.files,
            parent_agent: args.parent,
            depth: args.depth,
            force_hierarchy: args.force_hierarchy,
        })
        .await?;

    emit(
        json,
        &serde_json::to_value(&session)?,
        &format!(
            "Spawned {} ({}) on {} in {}",
            session.agent_name, session.capability, session.branch_name, session.tmux_session
        ),
    );
    Ok(())
}
