// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs monitor` - the tier-2 supervisory agent.

use super::persistent;
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use ovs_core::Capability;

#[derive(Args)]
pub struct MonitorArgs {
    #[command(subcommand)]
    command: MonitorCommand,
}

#[derive(Subcommand)]
enum MonitorCommand {
    /// Start the monitor (requires tier2Enabled)
    Start {
        /// Attach to the monitor's tmux session after starting
        #[arg(long, conflicts_with = "no_attach")]
        attach: bool,
        /// Never attach, even on a terminal
        #[arg(long)]
        no_attach: bool,
    },
    /// Stop the monitor
    Stop,
    /// Show monitor liveness
    Status,
}

pub async fn run(args: MonitorArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    match args.command {
        MonitorCommand::Start { attach, no_attach } => {
            let attach = persistent::should_attach(attach, no_attach);
            persistent::start(&ctx, Capability::Monitor, attach, json).await
        }
        MonitorCommand::Stop => persistent::stop(&ctx, Capability::Monitor, json).await,
        MonitorCommand::Status => persistent::status(&ctx, Capability::Monitor, json),
    }
}
