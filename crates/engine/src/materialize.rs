// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Working-copy materialization: instruction overlay, hook definitions,
//! and the persisted agent identity record.

use ovs_core::{AgentSession, CapabilityDef, ControlDir};
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Context rendered into an overlay.
pub struct OverlayContext<'a> {
    pub agent_name: &'a str,
    pub capability: &'a str,
    pub bead_id: &'a str,
    pub parent_agent: Option<&'a str>,
    pub spec_path: Option<&'a Path>,
    pub files: &'a [String],
}

/// Render the capability's instruction template plus the per-agent context
/// block and write it to `.overstory/OVERLAY.md` inside the working copy.
pub fn materialize_overlay(
    dir: &ControlDir,
    worktree: &Path,
    def: &CapabilityDef,
    ctx: &OverlayContext<'_>,
) -> io::Result<PathBuf> {
    let template_path = dir.agent_defs_dir().join(&def.file);
    let template = std::fs::read_to_string(&template_path)?;

    let mut overlay = template;
    overlay.push_str("\n\n## Assignment\n\n");
    overlay.push_str(&format!("- Agent: {}\n", ctx.agent_name));
    overlay.push_str(&format!("- Capability: {}\n", ctx.capability));
    if !ctx.bead_id.is_empty() {
        overlay.push_str(&format!("- Work item: {}\n", ctx.bead_id));
    }
    if let Some(parent) = ctx.parent_agent {
        overlay.push_str(&format!("- Reports to: {}\n", parent));
    }
    if let Some(spec) = ctx.spec_path {
        overlay.push_str(&format!("- Spec: {}\n", spec.display()));
    }
    if !ctx.files.is_empty() {
        overlay.push_str(&format!("- Files in scope: {}\n", ctx.files.join(", ")));
    }

    let overlay_dir = worktree.join(".overstory");
    std::fs::create_dir_all(&overlay_dir)?;
    let overlay_path = overlay_dir.join("OVERLAY.md");
    std::fs::write(&overlay_path, overlay)?;
    Ok(overlay_path)
}

/// Deploy hook definitions into the target's host-configuration directory.
///
/// The hook commands are guarded on `OVERSTORY_AGENT_NAME` so the operator's
/// own session at the project root never fires them. Existing project
/// settings are merged, not replaced. The deployed shape is also recorded
/// in `$OVS/hooks.json`.
pub fn deploy_hooks(dir: &ControlDir, target_root: &Path, agent: &str) -> io::Result<()> {
    let settings_path = target_root.join(".claude/settings.json");
    let mut settings: Value = if settings_path.exists() {
        let content = std::fs::read_to_string(&settings_path)?;
        serde_json::from_str(&content).unwrap_or_else(|_| json!({}))
    } else {
        json!({})
    };

    inject_hooks(&mut settings, agent);

    std::fs::create_dir_all(target_root.join(".claude"))?;
    std::fs::write(
        &settings_path,
        serde_json::to_string_pretty(&settings).unwrap_or_else(|_| "{}".to_string()),
    )?;

    // Record the deployed manifest for doctor and clean
    let manifest = json!({
        "agent": agent,
        "settings": settings_path.display().to_string(),
        "events": ["PreToolUse", "PostToolUse", "Stop"],
    });
    std::fs::write(
        dir.hooks_manifest_path(),
        serde_json::to_string_pretty(&manifest).unwrap_or_else(|_| "{}".to_string()),
    )?;
    Ok(())
}

fn hook_command(agent: &str, event: &str) -> String {
    // The guard makes root-deployed hooks inert outside spawned sessions
    format!(
        "[ -n \"$OVERSTORY_AGENT_NAME\" ] && ovs log {} --agent {} --stdin || true",
        event, agent
    )
}

fn inject_hooks(settings: &mut Value, agent: &str) {
    // Runner hooks require nested structure with matcher and hooks fields
    let entry = |event: &str| {
        json!({
            "matcher": "*",
            "hooks": [{
                "type": "command",
                "command": hook_command(agent, event)
            }]
        })
    };

    if !settings.is_object() {
        *settings = json!({});
    }
    let Some(settings_obj) = settings.as_object_mut() else {
        return;
    };

    let hooks = settings_obj.entry("hooks").or_insert_with(|| json!({}));
    if !hooks.is_object() {
        *hooks = json!({});
    }
    let Some(hooks_obj) = hooks.as_object_mut() else {
        return;
    };

    hooks_obj.insert("PreToolUse".to_string(), json!([entry("tool-start")]));
    hooks_obj.insert("PostToolUse".to_string(), json!([entry("tool-end")]));
    // Stop has no matcher concept
    hooks_obj.insert(
        "Stop".to_string(),
        json!([{
            "matcher": "",
            "hooks": [{
                "type": "command",
                "command": hook_command(agent, "session-end")
            }]
        }]),
    );
}

/// Create or update the persisted agent identity record.
pub fn write_identity(dir: &ControlDir, session: &AgentSession) -> io::Result<()> {
    let path = dir.identity_path(&session.agent_name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(session)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(&path, yaml)
}

#[cfg(test)]
#[path = "materialize_tests.rs"]
mod tests;
