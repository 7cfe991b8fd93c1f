// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

async fn init_repo(dir: &Path) {
    run(dir, &["init", "-q"]).await.unwrap();
    run(dir, &["config", "user.email", "test@example.com"])
        .await
        .unwrap();
    run(dir, &["config", "user.name", "Test"]).await.unwrap();
    std::fs::write(dir.join("README.md"), "hello\n").unwrap();
    run(dir, &["add", "."]).await.unwrap();
    run(dir, &["commit", "-q", "-m", "initial"]).await.unwrap();
}

#[tokio::test]
async fn run_succeeds_on_valid_command() {
    let dir = tempdir().unwrap();
    init_repo(dir.path()).await;
    let out = run(dir.path(), &["status", "--short"]).await.unwrap();
    assert!(out.status.success());
}

#[tokio::test]
async fn run_fails_on_invalid_command() {
    let dir = tempdir().unwrap();
    init_repo(dir.path()).await;
    let err = run(dir.path(), &["not-a-real-subcommand"]).await.unwrap_err();
    assert!(matches!(err, WorkspaceError::GitFailed { .. }));
}

#[tokio::test]
async fn run_best_effort_swallows_errors() {
    let dir = tempdir().unwrap();
    init_repo(dir.path()).await;
    // Should not panic even though the command fails.
    run_best_effort(dir.path(), &["not-a-real-subcommand"]).await;
}

#[tokio::test]
async fn stdout_string_trims_output() {
    let dir = tempdir().unwrap();
    init_repo(dir.path()).await;
    let out = run(dir.path(), &["rev-parse", "HEAD"]).await.unwrap();
    let sha = stdout_string(&out);
    assert_eq!(sha.len(), 40);
}
