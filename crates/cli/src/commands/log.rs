// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ovs log` - the hook callback the AI runner invokes.
//!
//! Must never fail loudly mid-hook: observability errors are swallowed in
//! the intake layer, and this command exits zero for anything short of an
//! unusable invocation.

use crate::context::Context;
use crate::output::emit;
use anyhow::Result;
use clap::Args;
use ovs_engine::hooks::HookPayload;
use std::io::Read;

#[derive(Args)]
pub struct LogArgs {
    /// Hook event: tool-start, tool-end, or session-end
    pub event: String,

    /// Agent the hook fired for
    #[arg(long)]
    pub agent: String,

    /// Read the JSON payload from standard input (preferred)
    #[arg(long)]
    pub stdin: bool,

    /// Tool name (legacy flag form)
    #[arg(long)]
    pub tool_name: Option<String>,

    /// Transcript path (legacy flag form)
    #[arg(long)]
    pub transcript: Option<String>,
}

pub async fn run(args: LogArgs, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    let payload = read_payload(&args)?;
    let intake = ctx.hook_intake();

    match args.event.as_str() {
        "tool-start" => intake.handle_tool_start(&args.agent, &payload),
        "tool-end" => intake.handle_tool_end(&args.agent, &payload),
        "session-end" => {
            let outcome = intake.handle_session_end(&args.agent, &payload);
            if let Some(session) = outcome.completed {
                ctx.auto_record().run(&session).await;
            }
        }
        other => {
            return Err(ovs_core::OverstoryError::validation(format!(
                "event: unknown hook event '{}'",
                other
            ))
            .into())
        }
    }

    emit(
        json,
        &serde_json::json!({ "logged": args.event }),
        &format!("logged {}", args.event),
    );
    Ok(())
}

fn read_payload(args: &LogArgs) -> Result<HookPayload> {
    if args.stdin {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw)?;
        return Ok(HookPayload::from_json(&raw));
    }
    Ok(HookPayload {
        tool_name: args.tool_name.clone(),
        tool_input: None,
        session_id: None,
        transcript_path: args.transcript.clone(),
    })
}
