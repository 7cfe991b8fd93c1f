// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised by the workspace manager (spec.md §4.1, §7 `WorkspaceError`).

use std::path::PathBuf;
use thiserror::Error;

/// Errors from branch/worktree creation, removal, merge, and cleanup.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("git {command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source spawn for workspace-from is not a valid base (must be completed/failed/canceled)")]
    InvalidSourceSpawn,

    #[error("path is not a registered worktree: {0}")]
    NotAWorktree(PathBuf),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
