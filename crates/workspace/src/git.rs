// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Low-level `git` invocation helper. One shell-out helper, several call
//! sites — mirroring the teacher's single `git worktree remove --force`
//! callsite style in `oj-engine::executor`.

use crate::error::WorkspaceError;
use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, warn};

/// Run `git <args>` with the given working directory, returning stdout on
/// success or a [`WorkspaceError::GitFailed`] on a non-zero exit.
pub async fn run(repo: &Path, args: &[&str]) -> Result<Output, WorkspaceError> {
    let start = std::time::Instant::now();
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .await
        .map_err(|e| WorkspaceError::Io {
            path: repo.to_path_buf(),
            source: e,
        })?;

    let elapsed_ms = start.elapsed().as_millis();
    if output.status.success() {
        debug!(command = args.join(" "), elapsed_ms, "git command succeeded");
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        warn!(command = args.join(" "), elapsed_ms, stderr, "git command failed");
        Err(WorkspaceError::GitFailed {
            command: args.join(" "),
            stderr,
        })
    }
}

/// Run `git <args>` and discard the result, logging failures without
/// propagating them (best-effort cleanup paths).
pub async fn run_best_effort(repo: &Path, args: &[&str]) {
    if let Err(e) = run(repo, args).await {
        warn!(error = %e, "best-effort git command failed");
    }
}

pub fn stdout_string(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
