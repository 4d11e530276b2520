// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ovs-store: SQLite-backed stores for Overstory.
//!
//! Five databases, one store type each. Every store opens its database in
//! WAL mode with a 5-second busy timeout, creates its schema idempotently,
//! and applies additive column migrations so older databases keep working.
//! Multiple agent processes write concurrently; single SQL statements are
//! the unit of atomicity.

mod db;
mod events;
mod mail;
mod merge_queue;
mod metrics;
mod sessions;

pub use db::StoreError;
pub use events::{EventStore, ToolStat};
pub use mail::MailStore;
pub use merge_queue::MergeQueueStore;
pub use metrics::MetricsStore;
pub use sessions::{PurgeFilter, SessionStore};
