// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs clean` - purge stores and logs.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use clap::Args;
use ovs_core::SessionState;
use ovs_store::PurgeFilter;

#[derive(Args)]
pub struct CleanArgs {
    /// Purge everything below
    #[arg(long)]
    pub all: bool,

    /// Purge mail
    #[arg(long)]
    pub mail: bool,

    /// Purge completed and zombie session rows
    #[arg(long)]
    pub sessions: bool,

    /// Remove legacy text logs
    #[arg(long)]
    pub logs: bool,

    /// Purge events
    #[arg(long)]
    pub events: bool,

    /// Purge metrics and token snapshots
    #[arg(long)]
    pub metrics: bool,

    /// Purge the merge queue
    #[arg(long)]
    pub merge_queue: bool,
}

pub async fn run(args: CleanArgs, json: bool) -> Result<()> {
    let any = args.mail || args.sessions || args.logs || args.events || args.metrics
        || args.merge_queue;
    if !args.all && !any {
        return Err(ovs_core::OverstoryError::validation(
            "nothing selected; pass --all or one of --mail --sessions --logs --events --metrics --merge-queue",
        )
        .into());
    }

    let ctx = Context::open()?;
    let mut report = serde_json::Map::new();
    let mut human = Vec::new();

    if args.all || args.sessions {
        let mut count = ctx
            .sessions
            .purge(&PurgeFilter::State(SessionState::Completed))?;
        count += ctx.sessions.purge(&PurgeFilter::State(SessionState::Zombie))?;
        report.insert("sessions".into(), count.into());
        human.push(format!("{} terminal sessions", count));
    }
    if args.all || args.mail {
        let count = ctx.mail.purge_all()?;
        report.insert("mail".into(), count.into());
        human.push(format!("{} messages", count));
    }
    if args.all || args.events {
        let count = ctx.events.purge_all()?;
        report.insert("events".into(), count.into());
        human.push(format!("{} events", count));
    }
    if args.all || args.metrics {
        let count = ctx.metrics.purge_all()?;
        report.insert("metrics".into(), count.into());
        human.push(format!("{} metric rows", count));
    }
    if args.all || args.merge_queue {
        let count = ctx.merge_queue.purge_all()?;
        report.insert("mergeQueue".into(), count.into());
        human.push(format!("{} merge entries", count));
    }
    if args.all || args.logs {
        let removed = remove_logs(&ctx)?;
        report.insert("logDirs".into(), removed.into());
        human.push(format!("{} log directories", removed));
    }

    emit(
        json,
        &serde_json::Value::Object(report),
        &format!("Cleaned: {}", human.join(", ")),
    );
    Ok(())
}

fn remove_logs(ctx: &Context) -> Result<usize> {
    let root = ctx.dir.logs_root();
    let mut removed = 0;
    if let Ok(entries) = std::fs::read_dir(&root) {
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                std::fs::remove_dir_all(entry.path())?;
                removed += 1;
            }
        }
    }
    Ok(removed)
}
