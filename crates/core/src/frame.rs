// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast Frame: a typed, sequence-numbered message emitted by the session
//! daemon (spec.md §3, §6.1). The closed tag set and per-tag payload shapes
//! live in `conclave-daemon::wire`; this module owns the structural envelope
//! and the monotonic sequence counter (invariant I5).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Closed set of wire-protocol tags (spec.md §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameTag {
    Meta,
    Snapshot,
    Live,
    Started,
    Prompt,
    Event,
    Raw,
    Finished,
    Spawn,
    LoopStepStart,
    LoopStepEnd,
    LoopDone,
    Done,
    Control,
    ControlResult,
    Cancel,
}

impl FrameTag {
    /// `true` for frames that belong in the hub's bounded reconnect tail
    /// (spec.md §4.5.1: prompts, parsed events, raw output).
    pub fn is_replay_relevant(self) -> bool {
        matches!(self, FrameTag::Prompt | FrameTag::Event | FrameTag::Raw)
    }
}

/// A typed envelope with an auto-assigned monotonic sequence number.
///
/// `data` is generic over the payload; `conclave-daemon::wire` instantiates
/// this with a closed `Payload` enum covering every tag's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastFrame<T> {
    pub seq: u64,
    #[serde(rename = "type")]
    pub tag: FrameTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Strictly-increasing sequence number allocator, shared by the broadcast
/// hub (spec.md invariant I5: "strictly increasing within a daemon
/// lifetime").
#[derive(Clone, Default)]
pub struct SeqAllocator {
    next: Arc<AtomicU64>,
}

impl SeqAllocator {
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// The next sequence number that *would* be allocated, without
    /// allocating it (used to set a newly joined client's watermark).
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
