// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent capabilities and the capability manifest.
//!
//! A capability is the role an agent plays in the fleet. The manifest
//! (`agent-manifest.json`) defines, per capability, which instruction file,
//! model, and spawn rights it carries.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The role an agent plays in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Coordinator,
    Monitor,
    Lead,
    Scout,
    Builder,
    Reviewer,
    Merger,
}

impl Capability {
    /// All capabilities, in display order.
    pub const ALL: [Capability; 7] = [
        Capability::Coordinator,
        Capability::Monitor,
        Capability::Lead,
        Capability::Scout,
        Capability::Builder,
        Capability::Reviewer,
        Capability::Merger,
    ];

    /// Persistent agents live at the project root and survive across runs.
    ///
    /// Their AI runner fires a Stop hook on every turn, so the hook intake
    /// path must not treat `session-end` as completion for them.
    pub fn is_persistent(self) -> bool {
        matches!(self, Capability::Coordinator | Capability::Monitor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Coordinator => "coordinator",
            Capability::Monitor => "monitor",
            Capability::Lead => "lead",
            Capability::Scout => "scout",
            Capability::Builder => "builder",
            Capability::Reviewer => "reviewer",
            Capability::Merger => "merger",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coordinator" => Ok(Capability::Coordinator),
            "monitor" => Ok(Capability::Monitor),
            "lead" => Ok(Capability::Lead),
            "scout" => Ok(Capability::Scout),
            "builder" => Ok(Capability::Builder),
            "reviewer" => Ok(Capability::Reviewer),
            "merger" => Ok(Capability::Merger),
            other => Err(format!("unknown capability: {}", other)),
        }
    }
}

/// Per-capability definition from the agent manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDef {
    /// Instruction template file under `agent-defs/`
    pub file: String,
    /// Model the AI runner should use
    pub model: String,
    /// Tools the capability may use (informational, enforced by the runner)
    #[serde(default)]
    pub tools: Vec<String>,
    /// Capabilities this one may spawn
    #[serde(default)]
    pub can_spawn: Vec<String>,
}

/// The capability manifest (`agent-manifest.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapabilityManifest {
    #[serde(flatten)]
    capabilities: HashMap<String, CapabilityDef>,
}

impl CapabilityManifest {
    /// Load the manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self, crate::OverstoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::OverstoryError::Config(format!(
                "cannot read agent manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            crate::OverstoryError::Config(format!("invalid agent manifest: {}", e))
        })
    }

    /// Look up the definition for a capability.
    pub fn get(&self, capability: Capability) -> Option<&CapabilityDef> {
        self.capabilities.get(capability.as_str())
    }

    pub fn insert(&mut self, capability: Capability, def: CapabilityDef) {
        self.capabilities.insert(capability.as_str().to_string(), def);
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[cfg(test)]
#[path = "capability_tests.rs"]
mod tests;
