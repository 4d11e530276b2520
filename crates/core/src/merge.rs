// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Merge queue bookkeeping.
//!
//! Overstory queues finished branches for merging; conflict resolution
//! itself happens outside the core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStatus {
    Pending,
    Merging,
    Merged,
    Rejected,
}

impl MergeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MergeStatus::Pending => "pending",
            MergeStatus::Merging => "merging",
            MergeStatus::Merged => "merged",
            MergeStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MergeStatus::Pending),
            "merging" => Ok(MergeStatus::Merging),
            "merged" => Ok(MergeStatus::Merged),
            "rejected" => Ok(MergeStatus::Rejected),
            other => Err(format!("unknown merge status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeQueueEntry {
    pub branch_name: String,
    pub bead_id: String,
    pub agent_name: String,
    #[serde(default)]
    pub files_modified: Vec<String>,
    pub status: MergeStatus,
    pub enqueued_at: String,
    #[serde(default)]
    pub resolved_tier: Option<String>,
}
