// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Active Spawn (spec.md §3): the in-memory handle held while a spawn is
//! running. Cyclic references are avoided by design (spec.md §9): the
//! Active Spawn knows its record's id, the record never points back.

use crate::event_ring::EventRing;
use conclave_core::SpawnId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Single-slot, latest-wins interrupt mailbox (spec.md §3).
///
/// Both `InterruptSpawn` and the store-polling interrupt watcher deliver
/// through this same mailbox; a later delivery always overwrites an earlier
/// unread one, matching the Data Model's "capacity 1, latest-wins" wording.
#[derive(Default)]
pub struct InterruptMailbox {
    slot: Mutex<Option<String>>,
}

impl InterruptMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite any pending message with `message`.
    pub fn deliver(&self, message: impl Into<String>) {
        *self.slot.lock() = Some(message.into());
    }

    /// Take and clear the pending message, if any.
    pub fn take(&self) -> Option<String> {
        self.slot.lock().take()
    }
}

/// In-memory handle for a running spawn, destroyed when the spawn reaches a
/// terminal status (spec.md §3).
pub struct ActiveSpawn {
    pub id: SpawnId,
    /// Mutable so `ReparentSpawn` can update it in place (spec.md §4.4.5:
    /// "atomically update the parent-turn pointer in the record and, if the
    /// spawn is active, in the in-memory entry too").
    parent_turn_id: Mutex<conclave_core::TurnId>,
    pub parent_profile: String,
    pub child_profile: String,
    pub role: Option<String>,
    pub cancel: CancellationToken,
    pub events: EventRing,
    pub mailbox: InterruptMailbox,
    started_at: std::time::Instant,
    completed: AtomicBool,
    completion: Notify,
}

impl ActiveSpawn {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: SpawnId,
        parent_turn_id: conclave_core::TurnId,
        parent_profile: impl Into<String>,
        child_profile: impl Into<String>,
        role: Option<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            parent_turn_id: Mutex::new(parent_turn_id),
            parent_profile: parent_profile.into(),
            child_profile: child_profile.into(),
            role,
            cancel,
            events: EventRing::default(),
            mailbox: InterruptMailbox::new(),
            started_at: std::time::Instant::now(),
            completed: AtomicBool::new(false),
            completion: Notify::new(),
        }
    }

    /// Wall-clock time since this spawn entered the running state; backs
    /// `WaitAny`'s synthetic review checkpoints (spec.md §4.4.5).
    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Current parent-turn id, reflecting any prior [`Self::set_parent_turn_id`].
    pub fn parent_turn_id(&self) -> conclave_core::TurnId {
        self.parent_turn_id.lock().clone()
    }

    /// `ReparentSpawn` (spec.md §4.4.5): update the in-memory pointer to
    /// match the store write.
    pub fn set_parent_turn_id(&self, new_parent_turn_id: conclave_core::TurnId) {
        *self.parent_turn_id.lock() = new_parent_turn_id;
    }

    /// Signal the completion channel; idempotent, safe to call once from the
    /// spawn's own finalization path (spec.md §4.4.2 step 9 "Signal
    /// completion").
    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::SeqCst);
        self.completion.notify_waiters();
    }

    /// Block until [`ActiveSpawn::mark_completed`] has been called, racing
    /// correctly even if completion happens between the flag check and the
    /// subscribe (the standard `tokio::sync::Notify` wait pattern).
    pub async fn wait_completed(&self) {
        loop {
            if self.completed.load(Ordering::SeqCst) {
                return;
            }
            let notified = self.completion.notified();
            if self.completed.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
#[path = "active_spawn_tests.rs"]
mod tests;
