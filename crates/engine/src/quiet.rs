// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget wrapper for async observability writes.
//!
//! The synchronous counterpart lives in `ovs_core::best_effort`. Both exist
//! so fallible observability never aborts the surrounding action.

use std::fmt::Display;
use std::future::Future;

/// Await a fallible future and swallow its error.
pub async fn quiet<T, E: Display>(label: &str, fut: impl Future<Output = Result<T, E>>) {
    if let Err(e) = fut.await {
        tracing::debug!(label, error = %e, "best-effort operation failed");
    }
}
