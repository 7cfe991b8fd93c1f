// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session descriptor: the per-session on-disk record (spec.md §3, §6.2).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Identifier of a top-level session, owned by exactly one daemon process.
    #[derive(Default)]
    pub struct SessionId;
}

/// Lifecycle status of a session daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Starting,
    Running,
    Done,
    Cancelled,
    Error,
    Dead,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Done | SessionStatus::Cancelled | SessionStatus::Error | SessionStatus::Dead
        )
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Starting => "starting",
            SessionStatus::Running => "running",
            SessionStatus::Done => "done",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Error => "error",
            SessionStatus::Dead => "dead",
        };
        write!(f, "{s}")
    }
}

/// Per-session on-disk record (`meta.json`, spec.md §6.2).
///
/// Immutable paths are fixed at creation; `status`/`pid`/timestamps are
/// updated in place as the daemon's lifecycle advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub id: SessionId,
    /// Process id of the owning daemon, set once the daemon has forked.
    pub pid: Option<u32>,
    pub status: SessionStatus,
    pub started_at_ms: u64,
    pub ended_at_ms: Option<u64>,
    pub project_name: String,
    /// Opaque snapshot of the loop definition used to start this session
    /// (the loop-runtime collaborator owns its shape; we store it as JSON so
    /// this crate never needs to know its schema).
    pub loop_definition: serde_json::Value,
    pub socket_path: PathBuf,
    pub journal_path: PathBuf,
    pub daemon_log_path: PathBuf,
}

impl SessionDescriptor {
    pub fn new(
        id: SessionId,
        project_name: impl Into<String>,
        loop_definition: serde_json::Value,
        socket_path: PathBuf,
        journal_path: PathBuf,
        daemon_log_path: PathBuf,
        started_at_ms: u64,
    ) -> Self {
        Self {
            id,
            pid: None,
            status: SessionStatus::Starting,
            started_at_ms,
            ended_at_ms: None,
            project_name: project_name.into(),
            loop_definition,
            socket_path,
            journal_path,
            daemon_log_path,
        }
    }

    /// Transition to `Running` and record the daemon's pid.
    pub fn mark_running(&mut self, pid: u32) {
        self.pid = Some(pid);
        self.status = SessionStatus::Running;
    }

    /// Transition to a terminal status, recording the end timestamp.
    pub fn mark_terminal(&mut self, status: SessionStatus, ended_at_ms: u64) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.ended_at_ms = Some(ended_at_ms);
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
