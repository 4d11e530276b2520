// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs status` - one coherent view of the fleet.

use crate::context::Context;
use crate::output::pad;
use anyhow::Result;
use clap::Args;
use ovs_core::{format_elapsed_ms, clock::ms_from_rfc3339, SystemClock, Clock};
use ovs_engine::status::{StatusQuery, StatusSnapshot};
use std::time::Duration;

#[derive(Args)]
pub struct StatusArgs {
    /// Restrict to one agent
    #[arg(long)]
    pub agent: Option<String>,

    /// Include completed and zombie sessions
    #[arg(long)]
    pub all: bool,

    /// Per-agent tool statistics
    #[arg(long)]
    pub verbose: bool,

    /// Refresh continuously
    #[arg(long)]
    pub watch: bool,

    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub interval: u64,
}

pub async fn run(args: StatusArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    let query = StatusQuery {
        agent: args.agent.clone(),
        all: args.all,
    };

    loop {
        let snapshot = StatusSnapshot::collect(&ctx.sessions, &ctx.metrics, &ctx.mail, &query)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            if args.watch {
                // Clear the terminal between refreshes
                print!("\x1b[2J\x1b[H");
            }
            render(&ctx, &snapshot, args.verbose)?;
        }

        if !args.watch {
            break;
        }
        tokio::time::sleep(Duration::from_millis(args.interval)).await;
    }
    Ok(())
}

fn render(ctx: &Context, snapshot: &StatusSnapshot, verbose: bool) -> Result<()> {
    if snapshot.sessions.is_empty() {
        println!("No sessions.");
    } else {
        println!(
            "{} {} {} {} {} {}",
            pad("AGENT", 14),
            pad("CAPABILITY", 12),
            pad("STATE", 10),
            pad("BEAD", 12),
            pad("IDLE", 8),
            "PARENT"
        );
        let now = SystemClock.now_ms();
        for s in &snapshot.sessions {
            let idle = ms_from_rfc3339(&s.last_activity)
                .map(|last| format_elapsed_ms(now.saturating_sub(last)))
                .unwrap_or_else(|| "?".to_string());
            println!(
                "{} {} {} {} {} {}",
                pad(&s.agent_name, 14),
                pad(s.capability.as_str(), 12),
                pad(s.state.as_str(), 10),
                pad(&s.bead_id, 12),
                pad(&idle, 8),
                s.parent_agent.as_deref().unwrap_or("-")
            );
        }
    }

    for run in snapshot.runs.iter().filter(|r| r.completed_at.is_none()) {
        println!("run {}: {} agents ({})", run.id, run.agent_count, run.status);
    }

    for (agent, count) in &snapshot.unread_mail {
        println!("mail: {} has {} unread", agent, count);
    }

    if !snapshot.latest_usage.is_empty() {
        println!();
        println!("{} {} {}", pad("AGENT", 14), pad("OUT TOKENS", 12), "MODEL");
        for snap in &snapshot.latest_usage {
            println!(
                "{} {} {}",
                pad(&snap.agent_name, 14),
                pad(&snap.tokens.output_tokens.to_string(), 12),
                snap.model_used.as_deref().unwrap_or("-")
            );
        }
    }

    if verbose {
        for s in &snapshot.sessions {
            let stats = ctx.events.tool_stats(&s.agent_name, None)?;
            if stats.is_empty() {
                continue;
            }
            println!();
            println!("{} tools:", s.agent_name);
            for stat in stats {
                println!(
                    "  {} {} calls, {}",
                    pad(&stat.tool_name, 12),
                    stat.count,
                    format_elapsed_ms(stat.total_duration_ms)
                );
            }
        }
    }
    Ok(())
}
