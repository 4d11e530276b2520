// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session usage metrics and token snapshots.

use serde::{Deserialize, Serialize};

/// Cumulative token counters parsed from an AI-runner transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_read_tokens: u64,
    pub cache_creation_tokens: u64,
}

impl TokenTotals {
    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0
            && self.output_tokens == 0
            && self.cache_read_tokens == 0
            && self.cache_creation_tokens == 0
    }
}

/// One row per (agent, bead): session totals recorded at session end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub agent_name: String,
    #[serde(default)]
    pub bead_id: String,
    #[serde(flatten)]
    pub tokens: TokenTotals,
    #[serde(default)]
    pub estimated_cost_usd: Option<f64>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub merge_result: Option<String>,
    #[serde(default)]
    pub parent_agent: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Periodic usage observation during a live session. History is retained;
/// there is no primary-key uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSnapshot {
    pub agent_name: String,
    #[serde(flatten)]
    pub tokens: TokenTotals,
    #[serde(default)]
    pub model_used: Option<String>,
    pub created_at: String,
}
