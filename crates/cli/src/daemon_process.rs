// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detached daemon process management, mirroring
//! `oj-cli::daemon_process::{start_daemon_background, find_ojd_binary,
//! probe_socket}` but scoped to one daemon per session rather than one
//! user-level multiplexing daemon.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Locate the `conclaved` binary: explicit override, then a sibling of the
/// running `conclave` binary, then bare `conclaved` resolved via `PATH`.
fn find_daemon_binary() -> PathBuf {
    if let Some(path) = crate::env::daemon_binary() {
        return PathBuf::from(path);
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("conclaved");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    PathBuf::from("conclaved")
}

/// Fork `conclaved` in the background, fully detached from this process's
/// stdio, passing the session id and config path via environment
/// variables (spec.md §4.5 startup contract).
pub fn start_daemon_background(session_id: &str, config_path: &Path) -> anyhow::Result<()> {
    let binary = find_daemon_binary();
    Command::new(&binary)
        .env("CONCLAVE_SESSION_ID", session_id)
        .env("CONCLAVE_SESSION_CONFIG", config_path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to start {}: {e}", binary.display()))?;
    Ok(())
}

/// Probe whether a Unix socket is accepting connections.
pub fn probe_socket(socket_path: &Path) -> bool {
    std::os::unix::net::UnixStream::connect(socket_path).is_ok()
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
