// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout/polling configuration, mirroring `oj-cli::client`'s
//! env-var-overridable timeout knobs.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Timeout for one IPC round trip (a control request and its result).
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("CONCLAVE_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for a freshly started daemon to accept connections.
pub fn timeout_connect() -> Duration {
    parse_duration_ms("CONCLAVE_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Polling interval between connection retries while a daemon is starting.
pub fn poll_interval() -> Duration {
    parse_duration_ms("CONCLAVE_CONNECT_POLL_MS").unwrap_or(Duration::from_millis(50))
}
