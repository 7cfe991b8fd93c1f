// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission / Queue (spec.md §4.4.1, §4.4.3): instance and parallel caps,
//! and the FIFO pending queue with fair single-admission-per-completion
//! re-check.

use crate::error::OrchestratorError;
use conclave_core::{SpawnId, SpawnRequest};
use tokio::sync::oneshot;

/// Effective per-child-profile instance cap for an admission check
/// (spec.md §4.4.1 Admission, "Instance cap"): a positive per-entry
/// override takes precedence over the child profile's intrinsic cap.
pub fn effective_instance_cap(entry_cap: Option<u32>, profile_intrinsic_cap: Option<u32>) -> Option<u32> {
    entry_cap.filter(|&cap| cap > 0).or(profile_intrinsic_cap)
}

/// Whether a request may be admitted immediately given current counters
/// (spec.md §4.4.1 Admission). Both caps must pass.
pub fn can_admit(parent_running: u32, parallel_cap: u32, child_instances: u32, instance_cap: Option<u32>) -> bool {
    if let Some(cap) = instance_cap {
        if child_instances >= cap {
            return false;
        }
    }
    parent_running < parallel_cap
}

/// A queued delegation request awaiting an admission slot (spec.md §3
/// "Pending Spawn").
pub struct PendingSpawn {
    pub request: SpawnRequest,
    pub parent_profile: String,
    pub child_profile: String,
    pub instance_cap: Option<u32>,
    pub parallel_cap: u32,
    pub reply: oneshot::Sender<Result<SpawnId, OrchestratorError>>,
}

/// FIFO queue of [`PendingSpawn`]s, scanned in insertion order on every
/// completion (spec.md §4.4.3, §9 "Queue fairness").
#[derive(Default)]
pub struct PendingQueue {
    entries: Vec<PendingSpawn>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, entry: PendingSpawn) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return the first entry for which `eligible` holds,
    /// preserving the relative order of everything else (spec.md §9: "the
    /// first eligible entry is released", not necessarily the head).
    pub fn take_first_eligible<F>(&mut self, mut eligible: F) -> Option<PendingSpawn>
    where
        F: FnMut(&PendingSpawn) -> bool,
    {
        let idx = self.entries.iter().position(|e| eligible(e))?;
        Some(self.entries.remove(idx))
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
