// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator error taxonomy (spec.md §7).

use conclave_core::SpawnId;
use conclave_store::StoreError;
use conclave_workspace::WorkspaceError;
use thiserror::Error;

/// Errors surfaced by the orchestrator core, matching the spec.md §7
/// taxonomy one-for-one.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Bad Spawn Request: missing delegation, unknown profile, ambiguous
    /// role, invalid source spawn. No record is created.
    #[error("validation error: {0}")]
    Validation(String),

    /// Branch/worktree creation failed. Counters already rolled back.
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// Store write failed. Workspace cleaned up, counters rolled back.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// Agent binding missing for the resolved child profile. A `failed`
    /// record was still created so the operator sees the failure.
    #[error("spawn {spawn_id}: no agent binding registered for profile {profile:?}")]
    Binding { spawn_id: SpawnId, profile: String },

    /// Child loop returned a non-cancellation error. Classified `failed`.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The spawn's context was canceled. Not surfaced as an error at the
    /// daemon level; kept here so `StartSpawn`'s internal plumbing has a
    /// uniform return type.
    #[error("spawn {0} was canceled")]
    Cancellation(SpawnId),

    /// Configured per-entry timeout elapsed before the child loop returned.
    #[error("spawn {spawn_id} timed out after {minutes} minute(s)")]
    Timeout { spawn_id: SpawnId, minutes: u32 },

    /// Requested spawn id is not known to this orchestrator.
    #[error("unknown spawn: {0}")]
    UnknownSpawn(SpawnId),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
