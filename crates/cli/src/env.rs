// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate, mirroring
//! `oj-cli::env`.

/// Override for the `conclaved` binary path, for dev builds that run the
/// CLI without installing it.
pub fn daemon_binary() -> Option<String> {
    std::env::var("CONCLAVE_DAEMON_BINARY").ok()
}
