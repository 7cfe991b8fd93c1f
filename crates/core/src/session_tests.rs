// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn descriptor() -> SessionDescriptor {
    SessionDescriptor::new(
        SessionId::new("sess-1"),
        "demo-project",
        serde_json::json!({"steps": []}),
        PathBuf::from("/tmp/sess-1/sock"),
        PathBuf::from("/tmp/sess-1/events.jsonl"),
        PathBuf::from("/tmp/sess-1/daemon.log"),
        1_000,
    )
}

#[test]
fn new_session_starts_in_starting_state() {
    let d = descriptor();
    assert_eq!(d.status, SessionStatus::Starting);
    assert!(d.pid.is_none());
    assert!(d.ended_at_ms.is_none());
}

#[test]
fn mark_running_sets_pid_and_status() {
    let mut d = descriptor();
    d.mark_running(4242);
    assert_eq!(d.pid, Some(4242));
    assert_eq!(d.status, SessionStatus::Running);
}

#[test]
fn mark_terminal_records_end_timestamp() {
    let mut d = descriptor();
    d.mark_running(1);
    d.mark_terminal(SessionStatus::Done, 5_000);
    assert_eq!(d.status, SessionStatus::Done);
    assert_eq!(d.ended_at_ms, Some(5_000));
    assert!(d.status.is_terminal());
}

#[test]
fn non_terminal_statuses_are_not_terminal() {
    assert!(!SessionStatus::Starting.is_terminal());
    assert!(!SessionStatus::Running.is_terminal());
}
