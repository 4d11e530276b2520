// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs coordinator` - the top-of-hierarchy persistent agent.

use super::{persistent, watch};
use crate::context::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use ovs_core::Capability;

#[derive(Args)]
pub struct CoordinatorArgs {
    #[command(subcommand)]
    command: CoordinatorCommand,
}

#[derive(Subcommand)]
enum CoordinatorCommand {
    /// Start the coordinator at the project root
    Start {
        /// Attach to the coordinator's tmux session after starting
        #[arg(long, conflicts_with = "no_attach")]
        attach: bool,
        /// Never attach, even on a terminal
        #[arg(long)]
        no_attach: bool,
        /// Also start the background watchdog
        #[arg(long)]
        watchdog: bool,
        /// Also start the tier-2 monitor agent
        #[arg(long)]
        monitor: bool,
    },
    /// Stop the coordinator and close out the active run
    Stop,
    /// Show coordinator liveness
    Status,
}

pub async fn run(args: CoordinatorArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    match args.command {
        CoordinatorCommand::Start {
            attach,
            no_attach,
            watchdog,
            monitor,
        } => {
            let attach = persistent::should_attach(attach, no_attach);
            // Companions first so the coordinator wakes into a supervised fleet
            if watchdog {
                watch::start_background(&ctx, json)?;
            }
            if monitor {
                persistent::start(&ctx, Capability::Monitor, false, json).await?;
            }
            persistent::start(&ctx, Capability::Coordinator, attach, json).await
        }
        CoordinatorCommand::Stop => persistent::stop(&ctx, Capability::Coordinator, json).await,
        CoordinatorCommand::Status => persistent::status(&ctx, Capability::Coordinator, json),
    }
}
