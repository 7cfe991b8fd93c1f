// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event Ring (spec.md §4.2): a bounded, lossy, thread-safe buffer of recent
//! stream events for a single spawn. Lock-and-clone discipline matching the
//! teacher's `MaterializedState` snapshots passed to `spawn_checkpoint`.

use conclave_core::Event;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Default ring capacity (spec.md §4.2: "e.g. 1000").
pub const DEFAULT_CAPACITY: usize = 1000;

/// Fixed-capacity, append-overwrites-oldest buffer of recent events.
pub struct EventRing {
    capacity: usize,
    buf: Mutex<VecDeque<Event>>,
}

impl EventRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            buf: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
        }
    }

    /// Append an event; if full, the oldest entry is overwritten. Never
    /// blocks (spec.md §4.2 contract).
    pub fn add(&self, event: Event) {
        let mut buf = self.buf.lock();
        if buf.len() >= self.capacity {
            buf.pop_front();
        }
        buf.push_back(event);
    }

    /// Return a freshly allocated in-order copy of current contents, length
    /// at most `capacity`. Safe to call concurrently with `add`.
    pub fn snapshot(&self) -> Vec<Event> {
        self.buf.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventRing {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "event_ring_tests.rs"]
mod tests;
