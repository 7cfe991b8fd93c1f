// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve sessions root: CONCLAVE_STATE_DIR > XDG_STATE_HOME/conclave > ~/.local/state/conclave
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CONCLAVE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("conclave"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".local/state/conclave"))
}

/// Override for the orchestrator's `WaitAny` synthetic-checkpoint interval
/// (spec.md §4.4.3 "review window").
pub fn review_interval_ms() -> Option<Duration> {
    std::env::var("CONCLAVE_REVIEW_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
