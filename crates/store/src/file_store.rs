// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed [`Store`] implementation. A single JSON snapshot file per
//! session, written atomically (temp file, fsync, rename, directory fsync)
//! on every mutation — the same durability ordering as the teacher's
//! `oj-daemon::main::spawn_checkpoint` / `oj-storage::snapshot::Snapshot::save`.

use crate::error::StoreError;
use crate::traits::{Store, CLEANUP_ELIGIBLE_STATUSES};
use async_trait::async_trait;
use conclave_core::{SessionDescriptor, SessionId, SpawnId, SpawnRecord, TurnId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct State {
    spawns: HashMap<String, SpawnRecord>,
    spawn_order: Vec<String>,
    pending_interrupts: HashMap<String, String>,
    sessions: HashMap<String, SessionDescriptor>,
}

/// File-backed store: one JSON document under `path`, rewritten atomically
/// whenever the in-memory state changes.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl FileStore {
    /// Open (or create) a store at `path`. If the file exists and parses,
    /// its contents are loaded; otherwise a fresh empty state is used.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let file = File::open(&path).map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;
            let reader = BufReader::new(file);
            serde_json::from_reader(reader).unwrap_or_else(|e| {
                warn!(error = %e, path = %path.display(), "corrupt store snapshot, starting fresh");
                State::default()
            })
        } else {
            State::default()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Write the current state to disk: temp file, fsync, rename, then
    /// fsync the parent directory so the rename itself is durable.
    fn flush(&self, state: &State) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path).map_err(|e| StoreError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, state)?;
            let file = writer.into_inner().map_err(|e| StoreError::Io {
                path: tmp_path.clone(),
                source: e.into_error(),
            })?;
            file.sync_all().map_err(|e| StoreError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        sync_dir(&self.path);
        debug!(path = %self.path.display(), "store snapshot flushed");
        Ok(())
    }
}

fn sync_dir(file_path: &Path) {
    if let Some(dir) = file_path.parent() {
        if let Ok(d) = File::open(dir) {
            let _ = d.sync_all();
        }
    }
}

#[async_trait]
impl Store for FileStore {
    async fn put_spawn(&self, record: &SpawnRecord) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.lock();
            let key = record.id.to_string();
            if !state.spawns.contains_key(&key) {
                state.spawn_order.push(key.clone());
            }
            state.spawns.insert(key, record.clone());
            state.clone()
        };
        self.flush(&snapshot)
    }

    async fn get_spawn(&self, id: SpawnId) -> Result<Option<SpawnRecord>, StoreError> {
        Ok(self.state.lock().spawns.get(&id.to_string()).cloned())
    }

    async fn list_spawns_for_turn(&self, turn_id: &TurnId) -> Result<Vec<SpawnRecord>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .spawn_order
            .iter()
            .filter_map(|id| state.spawns.get(id))
            .filter(|r| &r.parent_turn_id == turn_id)
            .cloned()
            .collect())
    }

    async fn list_terminal_spawns(&self) -> Result<Vec<SpawnRecord>, StoreError> {
        let state = self.state.lock();
        Ok(state
            .spawn_order
            .iter()
            .filter_map(|id| state.spawns.get(id))
            .filter(|r| CLEANUP_ELIGIBLE_STATUSES.contains(&r.status))
            .cloned()
            .collect())
    }

    async fn reparent_spawn(&self, id: SpawnId, new_parent_turn_id: &TurnId) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.lock();
            let key = id.to_string();
            let record = state.spawns.get_mut(&key).ok_or(StoreError::SpawnNotFound(id))?;
            record.parent_turn_id = new_parent_turn_id.clone();
            state.clone()
        };
        self.flush(&snapshot)
    }

    async fn set_pending_interrupt(&self, id: SpawnId, message: &str) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.lock();
            state.pending_interrupts.insert(id.to_string(), message.to_string());
            state.clone()
        };
        self.flush(&snapshot)
    }

    async fn take_pending_interrupt(&self, id: SpawnId) -> Result<Option<String>, StoreError> {
        let (taken, snapshot) = {
            let mut state = self.state.lock();
            let taken = state.pending_interrupts.remove(&id.to_string());
            (taken, state.clone())
        };
        if taken.is_some() {
            self.flush(&snapshot)?;
        }
        Ok(taken)
    }

    async fn put_session(&self, descriptor: &SessionDescriptor) -> Result<(), StoreError> {
        let snapshot = {
            let mut state = self.state.lock();
            state
                .sessions
                .insert(descriptor.id.as_str().to_string(), descriptor.clone());
            state.clone()
        };
        self.flush(&snapshot)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<SessionDescriptor>, StoreError> {
        Ok(self.state.lock().sessions.get(id.as_str()).cloned())
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
