// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use conclave_core::{SpawnId, TurnId};
use std::path::PathBuf;
use tokio::sync::mpsc;

fn config(prompt: &str) -> ChildLoopConfig {
    ChildLoopConfig {
        spawn_id: SpawnId(1),
        parent_turn_id: TurnId("t1".to_string()),
        profile: "coder".to_string(),
        plan_id: None,
        prompt: prompt.to_string(),
        cwd: PathBuf::from("/tmp"),
        extra_env: vec![],
    }
}

#[tokio::test]
async fn streams_stdout_lines_and_reports_exit_code() {
    let binding = ProcessBinding::new(vec![
        "sh".to_string(),
        "-c".to_string(),
        "echo line-one; echo line-two; exit 0".to_string(),
    ]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = binding.run(&config(""), CancellationToken::new(), tx).await;

    assert_eq!(outcome.exit_code, Some(0));
    assert!(!outcome.canceled);
    assert_eq!(rx.recv().await.unwrap(), "line-one");
    assert_eq!(rx.recv().await.unwrap(), "line-two");
}

#[tokio::test]
async fn cancellation_kills_child_and_reports_canceled() {
    let binding = ProcessBinding::new(vec!["sh".to_string(), "-c".to_string(), "sleep 30".to_string()]);
    let (tx, _rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let handle = tokio::spawn(async move { binding.run(&config(""), cancel_clone, tx).await });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(outcome.canceled);
    assert!(outcome.exit_code.is_none());
}

#[tokio::test]
async fn missing_command_reports_error_outcome() {
    let binding = ProcessBinding::new(vec![]);
    let (tx, _rx) = mpsc::unbounded_channel();
    let outcome = binding.run(&config(""), CancellationToken::new(), tx).await;
    assert!(outcome.error.is_some());
    assert!(outcome.exit_code.is_none());
}
