// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The record store's black-box persistence interface (spec.md §6,
//! "treated as a black-box persistence interface with the operations
//! enumerated in §6"). `conclave-orchestrator` is generic over this trait;
//! it never assumes a concrete backing format.

use crate::error::StoreError;
use async_trait::async_trait;
use conclave_core::{SessionDescriptor, SessionId, SpawnId, SpawnRecord, SpawnStatus, TurnId};

/// Terminal statuses `CleanupStaleWorktrees` treats as eligible for
/// workspace removal (spec.md §4.4.5): completed, failed, merged, rejected.
/// `canceled` is deliberately excluded — its workspace is left for the
/// operator to inspect or resume from (spec.md §4.3, §7 "Cancellation").
pub const CLEANUP_ELIGIBLE_STATUSES: &[SpawnStatus] = &[
    SpawnStatus::Completed,
    SpawnStatus::Failed,
    SpawnStatus::Merged,
    SpawnStatus::Rejected,
];

/// Persistence operations the orchestrator needs from the record store.
///
/// Every method is independently atomic from the caller's perspective; the
/// orchestrator does not assume cross-method transactions.
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist a new or updated spawn record (spec.md §4.4.2 step 3,
    /// §4.3 terminal transitions).
    async fn put_spawn(&self, record: &SpawnRecord) -> Result<(), StoreError>;

    /// Fetch a single spawn record by id.
    async fn get_spawn(&self, id: SpawnId) -> Result<Option<SpawnRecord>, StoreError>;

    /// All spawn records whose `parent_turn_id` matches, in creation order
    /// (spec.md §4.4.5 `Wait`/`WaitAny`).
    async fn list_spawns_for_turn(&self, turn_id: &TurnId) -> Result<Vec<SpawnRecord>, StoreError>;

    /// Every spawn record in this store whose status is one of
    /// [`CLEANUP_ELIGIBLE_STATUSES`] (spec.md §4.4.5 `CleanupStaleWorktrees`,
    /// "workspaces of spawns in {completed, failed, merged, rejected}"). A
    /// `Store` instance is scoped to a single session (spec.md §6.2), so no
    /// session id parameter is needed.
    async fn list_terminal_spawns(&self) -> Result<Vec<SpawnRecord>, StoreError>;

    /// Atomically update the parent-turn pointer on a persisted record
    /// (spec.md §4.4.5 `ReparentSpawn`).
    async fn reparent_spawn(&self, id: SpawnId, new_parent_turn_id: &TurnId) -> Result<(), StoreError>;

    /// Set a pending interrupt message for a spawn (spec.md §4.4.2 step 8
    /// "Interrupt watcher" polls this column every 250ms).
    async fn set_pending_interrupt(&self, id: SpawnId, message: &str) -> Result<(), StoreError>;

    /// Atomically read and clear the pending interrupt for a spawn, if any.
    async fn take_pending_interrupt(&self, id: SpawnId) -> Result<Option<String>, StoreError>;

    /// Persist a session descriptor (spec.md §6.2 `meta.json`).
    async fn put_session(&self, descriptor: &SessionDescriptor) -> Result<(), StoreError>;

    /// Fetch a session descriptor by id.
    async fn get_session(&self, id: &SessionId) -> Result<Option<SessionDescriptor>, StoreError>;
}
