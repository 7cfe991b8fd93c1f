// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store errors (spec.md §7 `PersistenceError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("spawn record not found: {0}")]
    SpawnNotFound(conclave_core::SpawnId),
    #[error("session descriptor not found: {0}")]
    SessionNotFound(conclave_core::SessionId),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
