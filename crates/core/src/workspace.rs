// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace identifiers and status, shared between the orchestrator and the
//! workspace manager crate.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Identifier of an isolated per-spawn workspace (worktree).
    #[derive(Default)]
    pub struct WorkspaceId;
}

/// Lifecycle status of a managed workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceStatus {
    /// Branch/worktree creation is in progress.
    Creating,
    /// Worktree materialized and ready for agent use.
    Ready,
    /// Being torn down (auto-commit, worktree remove).
    Cleaning,
}

impl std::fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkspaceStatus::Creating => "creating",
            WorkspaceStatus::Ready => "ready",
            WorkspaceStatus::Cleaning => "cleaning",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
