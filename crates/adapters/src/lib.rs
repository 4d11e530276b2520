// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ovs-adapters: typed wrappers around the external tools Overstory
//! composes — the terminal multiplexer, git worktrees, the issue tracker,
//! and the domain-expertise client. Each adapter exposes a narrow trait,
//! encapsulates subprocess invocation, and parses output into typed results.

pub mod expertise;
pub mod mux;
pub mod proc;
pub mod subprocess;
pub mod tracker;
pub mod worktree;

pub use expertise::{ExpertiseClient, ExpertiseError, MulchExpertise};
pub use mux::{MuxAdapter, MuxError, TmuxAdapter};
pub use proc::ProcessTree;
pub use tracker::{Bead, BeadTracker, TrackerClient, TrackerError};
pub use worktree::{GitWorktree, WorktreeAdapter, WorktreeError};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use expertise::FakeExpertise;
#[cfg(any(test, feature = "test-support"))]
pub use mux::{FakeMuxAdapter, MuxCall};
#[cfg(any(test, feature = "test-support"))]
pub use tracker::FakeTracker;
#[cfg(any(test, feature = "test-support"))]
pub use worktree::FakeWorktree;
