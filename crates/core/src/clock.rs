// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so timers, timeouts, and timestamps are deterministically
//! testable without sleeping real wall-clock time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// A source of the current time, abstracted so tests can fast-forward it.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic instant, used for elapsed-time measurements (timeouts, liveness).
    fn now(&self) -> Instant;

    /// Wall-clock epoch milliseconds, used for persisted timestamps and branch
    /// names (`BranchName` embeds a UTC `YYYYMMDDTHHMMSS` timestamp).
    fn epoch_ms(&self) -> u64;
}

/// Production clock backed by the OS.
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Deterministic clock for tests. `now()` is anchored at construction time
/// (so `Instant` arithmetic still works) and `epoch_ms()` is an explicit,
/// independently advanceable counter.
#[derive(Clone)]
pub struct FakeClock {
    anchor: Instant,
    offset_ms: Arc<AtomicU64>,
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
            epoch_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start the fake clock at a specific epoch.
    pub fn at_epoch_ms(epoch_ms: u64) -> Self {
        let clock = Self::new();
        clock.epoch_ms.store(epoch_ms, Ordering::SeqCst);
        clock
    }

    /// Advance both the monotonic and epoch views of time by `ms`.
    pub fn advance_ms(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
        self.epoch_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.anchor + std::time::Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
