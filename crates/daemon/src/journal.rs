// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only events journal (`events.jsonl`, spec.md §6.2). Invariant I5
//! requires every broadcast frame be journaled before any client sees it;
//! the [`Dispatcher`](crate::dispatcher::Dispatcher) calls
//! [`Journal::append`] immediately before handing the frame to the hub.

use crate::wire::{self, Payload};
use conclave_core::{BroadcastFrame, FrameTag};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("io error opening journal at {path}: {source}")]
    Open { path: PathBuf, source: std::io::Error },
}

struct Inner {
    file: File,
    seq: AtomicU64,
}

/// Handle to the session's append-only journal file, opened once at daemon
/// startup in append mode (spec.md §4.5 "opens the journal file in append
/// mode").
#[derive(Clone)]
pub struct Journal {
    inner: Arc<Mutex<Inner>>,
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self, JournalError> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| JournalError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                file,
                seq: AtomicU64::new(0),
            })),
        })
    }

    /// Append a frame's tag/payload before it is ever broadcast. Best-effort
    /// past the first failure: a journal write error is logged, not
    /// propagated, so a full disk degrades observability rather than
    /// killing in-flight spawns (matching spec.md §7 "Propagation" — the
    /// daemon logs visible-to-client errors, it does not crash on them).
    pub fn append(&self, tag: FrameTag, payload: Option<&Payload>) {
        let frame = BroadcastFrame {
            seq: {
                let inner = self.inner.lock();
                inner.seq.fetch_add(1, Ordering::SeqCst)
            },
            tag,
            data: payload.cloned(),
        };
        let line = match wire::encode_line(&frame) {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "failed to encode journal frame");
                return;
            }
        };
        let mut inner = self.inner.lock();
        if let Err(e) = inner.file.write_all(line.as_bytes()) {
            warn!(error = %e, "failed to append to events journal");
        }
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
