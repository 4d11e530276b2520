// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs nudge` - inject a message into a live agent session.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct NudgeArgs {
    /// Target agent name (`orchestrator` reaches the operator session)
    pub agent: String,

    /// Message to deliver
    #[arg(default_value = "Please continue with the task.")]
    pub message: String,

    /// Sender recorded with the nudge
    #[arg(long, default_value = "operator")]
    pub from: String,

    /// Skip the debounce window
    #[arg(long)]
    pub force: bool,
}

pub async fn run(args: NudgeArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    let outcome = ctx
        .nudge_bus()
        .nudge(&args.agent, &args.message, &args.from, args.force)
        .await;

    let human = if outcome.delivered {
        format!("Nudged {}", args.agent)
    } else {
        format!("Nudge to {} dropped: {:?}", args.agent, outcome.reason)
    };
    emit(
        json,
        &serde_json::json!({
            "delivered": outcome.delivered,
            "reason": outcome.reason.map(|r| format!("{:?}", r)),
        }),
        &human,
    );

    if !outcome.delivered {
        anyhow::bail!(
            "nudge to {} was not delivered ({:?})",
            args.agent,
            outcome.reason
        );
    }
    Ok(())
}
