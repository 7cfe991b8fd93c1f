// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Store`] implementation for tests and scratch sessions.

use crate::error::StoreError;
use crate::traits::{Store, CLEANUP_ELIGIBLE_STATUSES};
use async_trait::async_trait;
use conclave_core::{SessionDescriptor, SessionId, SpawnId, SpawnRecord, TurnId};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    spawns: HashMap<SpawnId, SpawnRecord>,
    spawn_order: Vec<SpawnId>,
    pending_interrupts: HashMap<SpawnId, String>,
    sessions: HashMap<String, SessionDescriptor>,
}

/// Thread-safe in-memory store. Nothing is persisted to disk; state is lost
/// when the process exits (acceptable for tests and the non-durable queue
/// model spec.md §1 Non-goals already assumes).
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_spawn(&self, record: &SpawnRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.spawns.contains_key(&record.id) {
            inner.spawn_order.push(record.id);
        }
        inner.spawns.insert(record.id, record.clone());
        Ok(())
    }

    async fn get_spawn(&self, id: SpawnId) -> Result<Option<SpawnRecord>, StoreError> {
        Ok(self.inner.lock().spawns.get(&id).cloned())
    }

    async fn list_spawns_for_turn(&self, turn_id: &TurnId) -> Result<Vec<SpawnRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .spawn_order
            .iter()
            .filter_map(|id| inner.spawns.get(id))
            .filter(|r| &r.parent_turn_id == turn_id)
            .cloned()
            .collect())
    }

    async fn list_terminal_spawns(&self) -> Result<Vec<SpawnRecord>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .spawn_order
            .iter()
            .filter_map(|id| inner.spawns.get(id))
            .filter(|r| CLEANUP_ELIGIBLE_STATUSES.contains(&r.status))
            .cloned()
            .collect())
    }

    async fn reparent_spawn(&self, id: SpawnId, new_parent_turn_id: &TurnId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let record = inner.spawns.get_mut(&id).ok_or(StoreError::SpawnNotFound(id))?;
        record.parent_turn_id = new_parent_turn_id.clone();
        Ok(())
    }

    async fn set_pending_interrupt(&self, id: SpawnId, message: &str) -> Result<(), StoreError> {
        self.inner.lock().pending_interrupts.insert(id, message.to_string());
        Ok(())
    }

    async fn take_pending_interrupt(&self, id: SpawnId) -> Result<Option<String>, StoreError> {
        Ok(self.inner.lock().pending_interrupts.remove(&id))
    }

    async fn put_session(&self, descriptor: &SessionDescriptor) -> Result<(), StoreError> {
        self.inner
            .lock()
            .sessions
            .insert(descriptor.id.as_str().to_string(), descriptor.clone());
        Ok(())
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<SessionDescriptor>, StoreError> {
        Ok(self.inner.lock().sessions.get(id.as_str()).cloned())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
