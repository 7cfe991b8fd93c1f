//! CLI error handling specs.

use crate::prelude::*;

#[test]
fn spawn_missing_required_args_shows_usage_error() {
    let temp = Project::empty();

    temp.conclave()
        .args(&["spawn", "s1", "t1", "lead"])
        .fails()
        .stderr_has("Usage:");
}

#[test]
fn attach_to_unknown_session_reports_daemon_not_running() {
    let temp = Project::empty();

    temp.conclave()
        .args(&["attach", "nonexistent-session"])
        .fails()
        .stderr_has("daemon not running");
}

#[test]
fn cancel_unknown_session_reports_daemon_not_running() {
    let temp = Project::empty();

    temp.conclave()
        .args(&["cancel", "nonexistent-session"])
        .fails()
        .stderr_has("daemon not running");
}
