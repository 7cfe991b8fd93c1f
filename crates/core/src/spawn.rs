// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn Record: the authoritative unit of delegated work (spec.md §3).

use crate::owner::TurnId;
use crate::workspace::WorkspaceId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Monotonically assigned identifier for a spawn, unique per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnId(pub u64);

impl fmt::Display for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a spawn record (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnStatus {
    Running,
    Completed,
    Failed,
    Canceled,
    Merged,
    Rejected,
}

impl SpawnStatus {
    /// True for the four statuses a running spawn's child-loop termination
    /// can directly produce, and the two merge/reject statuses reachable
    /// only from `Completed`/any-non-terminal respectively.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SpawnStatus::Running)
    }
}

impl fmt::Display for SpawnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpawnStatus::Running => "running",
            SpawnStatus::Completed => "completed",
            SpawnStatus::Failed => "failed",
            SpawnStatus::Canceled => "canceled",
            SpawnStatus::Merged => "merged",
            SpawnStatus::Rejected => "rejected",
        };
        write!(f, "{s}")
    }
}

/// Sentinel exit code used when a canceled child produced none of its own
/// (spec.md §4.3, §7).
pub const CANCELED_EXIT_CODE_SENTINEL: i32 = -1;

/// A request to delegate work to a child agent (spec.md §4.4.1).
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub parent_turn_id: TurnId,
    pub parent_spawn_id: Option<SpawnId>,
    pub parent_profile: String,
    pub child_profile: String,
    pub requested_role: Option<String>,
    pub task_text: String,
    pub plan_id: Option<String>,
    pub read_only: bool,
    pub wait: bool,
    pub workspace_from_spawn_id: Option<SpawnId>,
    pub delegation_rule: crate::delegation::DelegationRule,
}

/// The authoritative unit of delegated work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub id: SpawnId,
    pub parent_turn_id: TurnId,
    pub parent_spawn_id: Option<SpawnId>,
    pub child_profile: String,
    pub role: Option<String>,
    pub task_text: String,
    pub plan_id: Option<String>,
    pub read_only: bool,
    pub branch_name: Option<String>,
    pub workspace_path: Option<PathBuf>,
    pub status: SpawnStatus,
    pub exit_code: Option<i32>,
    pub result: Option<String>,
    pub summary: Option<String>,
    pub merge_commit: Option<String>,
    pub handoff: bool,
    pub speed_hint: Option<String>,
    pub created_at_ms: u64,
    pub completed_at_ms: Option<u64>,
    pub workspace_from_spawn_id: Option<SpawnId>,
    /// Arbitrary metadata threaded through from the request (prompt vars,
    /// environment overrides); opaque to this crate.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SpawnRecord {
    pub fn new(id: SpawnId, request: &SpawnRequest, role: Option<String>, created_at_ms: u64) -> Self {
        Self {
            id,
            parent_turn_id: request.parent_turn_id.clone(),
            parent_spawn_id: request.parent_spawn_id,
            child_profile: request.child_profile.clone(),
            role,
            task_text: request.task_text.clone(),
            plan_id: request.plan_id.clone(),
            read_only: request.read_only,
            branch_name: None,
            workspace_path: None,
            status: SpawnStatus::Running,
            exit_code: None,
            result: None,
            summary: None,
            merge_commit: None,
            handoff: false,
            speed_hint: None,
            created_at_ms,
            completed_at_ms: None,
            workspace_from_spawn_id: request.workspace_from_spawn_id,
            metadata: HashMap::new(),
        }
    }

    /// Whether this record may serve as the source for a `workspace-from`
    /// request (spec.md §4.4.1 precondition 5 / §4.1 `CreateFrom`).
    pub fn is_valid_workspace_source(&self) -> bool {
        matches!(
            self.status,
            SpawnStatus::Completed | SpawnStatus::Failed | SpawnStatus::Canceled
        )
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
