// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Spawn State Machine (spec.md §4.3): explicit `match`-based transition
//! function, no generic FSM crate — matching `oj-core::job::StepStatus`'s
//! plain-enum-with-hand-written-impls shape.

use conclave_core::spawn::CANCELED_EXIT_CODE_SENTINEL;
use conclave_core::SpawnStatus;
use thiserror::Error;

/// How a child loop terminated, as observed by `StartSpawn` step 9
/// (spec.md §4.3).
#[derive(Debug, Clone)]
pub enum ChildTermination {
    /// The spawn's own (possibly wrapped) context was canceled.
    Canceled { exit_code: Option<i32> },
    /// The child loop returned an error that was not a cancellation.
    Failed { exit_code: Option<i32>, error: String },
    /// The child loop returned successfully.
    Completed { exit_code: i32 },
}

/// Guard-rule violation for `Merge`/`Reject` (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Merge is only valid from Completed (attempted from {from:?})")]
    InvalidTransition {
        from: SpawnStatus,
        attempted: &'static str,
    },
}

/// Classify a terminated child loop into its terminal [`SpawnStatus`] and
/// exit code (spec.md §4.3 "On child-loop termination").
pub fn classify_termination(termination: &ChildTermination) -> (SpawnStatus, i32) {
    match termination {
        ChildTermination::Canceled { exit_code } => {
            (SpawnStatus::Canceled, exit_code.unwrap_or(CANCELED_EXIT_CODE_SENTINEL))
        }
        ChildTermination::Failed { exit_code, .. } => (SpawnStatus::Failed, exit_code.unwrap_or(1)),
        ChildTermination::Completed { exit_code } => (SpawnStatus::Completed, *exit_code),
    }
}

/// `Merge` (spec.md §4.3): only valid from `Completed`.
pub fn apply_merge(current: SpawnStatus) -> Result<SpawnStatus, TransitionError> {
    if current == SpawnStatus::Completed {
        Ok(SpawnStatus::Merged)
    } else {
        Err(TransitionError::InvalidTransition {
            from: current,
            attempted: "merge",
        })
    }
}

/// `Reject` (spec.md §4.3): valid from any non-terminal state (cancels first)
/// or from `Completed`.
pub fn apply_reject(current: SpawnStatus) -> Result<SpawnStatus, TransitionError> {
    if current == SpawnStatus::Merged || current == SpawnStatus::Rejected {
        Err(TransitionError::InvalidTransition {
            from: current,
            attempted: "reject",
        })
    } else {
        Ok(SpawnStatus::Rejected)
    }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
