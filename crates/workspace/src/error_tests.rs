// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn git_failed_display_includes_command_and_stderr() {
    let err = WorkspaceError::GitFailed {
        command: "worktree add".to_string(),
        stderr: "fatal: branch exists".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("worktree add"));
    assert!(msg.contains("fatal: branch exists"));
}

#[test]
fn invalid_source_spawn_display() {
    assert!(WorkspaceError::InvalidSourceSpawn
        .to_string()
        .contains("valid base"));
}
