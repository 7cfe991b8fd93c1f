// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic branch naming (spec.md §4.1 `BranchName`, §6.4).

use conclave_core::clock::Clock;

/// Constant prefix for writable spawn branches.
pub const BRANCH_PREFIX: &str = "spawn";
/// Prefix prepended to read-only detached worktree names (spec.md §6.4).
pub const READONLY_PREFIX: &str = "ro-";

/// Collapse any character outside `{alnum, dot, hyphen, underscore}` to `_`
/// (spec.md §4.1 sanitization rule).
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Format a UTC timestamp with second granularity as `YYYYMMDDTHHMMSS`.
fn format_utc_seconds(epoch_ms: u64) -> String {
    let secs = (epoch_ms / 1000) as i64;
    let dt = chrono::DateTime::from_timestamp(secs, 0).unwrap_or_default();
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Build the deterministic branch name: prefix / parent turn id / sanitized
/// profile / UTC timestamp (spec.md §4.1 `BranchName`, §6.4).
pub fn branch_name(clock: &impl Clock, parent_turn_id: &str, child_profile: &str) -> String {
    format!(
        "{BRANCH_PREFIX}/{}/{}/{}",
        sanitize(parent_turn_id),
        sanitize(child_profile),
        format_utc_seconds(clock.epoch_ms())
    )
}

/// Build the name for a read-only detached worktree (spec.md §6.4: prepend
/// `ro-`).
pub fn readonly_worktree_name(clock: &impl Clock, parent_turn_id: &str, child_profile: &str) -> String {
    format!("{READONLY_PREFIX}{}", branch_name(clock, parent_turn_id, child_profile))
}

/// Sanitize a branch name for use as a filesystem path component under the
/// worktree directory (spec.md §4.1 `Create`: `<repo>/<worktree-dir>/<sanitized-branch>/`).
pub fn sanitize_for_path(branch: &str) -> String {
    sanitize(branch)
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
