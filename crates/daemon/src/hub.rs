// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast Hub (spec.md §4.5.1): snapshot-then-live protocol, a bounded
//! reconnect tail, and a per-client write pipeline. Grounded in the
//! teacher's `MaterializedState` lock-and-clone discipline
//! (`oj-daemon::main::spawn_checkpoint`) adapted from periodic
//! checkpointing to per-join snapshotting.

use crate::wire::{self, Payload, SnapshotPayload};
use conclave_core::{BroadcastFrame, FrameTag, SeqAllocator, SpawnSnapshot};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Cap on the number of replay-relevant frames kept for reconnects
/// (spec.md §4.5.1 "capped by count (~128)").
pub const TAIL_MAX_FRAMES: usize = 128;
/// Cap on the total serialized size of the reconnect tail
/// (spec.md §4.5.1 "size (~512KB)").
pub const TAIL_MAX_BYTES: usize = 512 * 1024;
/// Wire cap on an outgoing snapshot frame (spec.md §4.5.1 "~900KB").
pub const SNAPSHOT_WIRE_CAP: usize = 900 * 1024;
/// Per-client write channel depth; a slow client's socket write lags behind
/// this queue, not the hub's broadcast call.
const CLIENT_QUEUE_DEPTH: usize = 1024;

/// The hub's bounded reconstruction state (spec.md §3 "Broadcast Frame").
#[derive(Debug, Clone, Default)]
pub struct ReconstructionState {
    pub loop_name: String,
    pub step: String,
    pub turn_summary: Option<String>,
    pub spawns: Vec<SpawnSnapshot>,
    pub done: Option<BroadcastFrame<Payload>>,
}

struct TailEntry {
    frame: BroadcastFrame<Payload>,
    encoded_len: usize,
}

struct HubState {
    reconstruction: ReconstructionState,
    tail: VecDeque<TailEntry>,
    tail_bytes: usize,
    clients: Vec<ClientHandle>,
}

struct ClientHandle {
    id: u64,
    tx: mpsc::Sender<String>,
}

/// A connected client's receive side, handed to the connection task that
/// owns the actual socket write half.
pub struct ClientSink {
    pub id: u64,
    pub rx: mpsc::Receiver<String>,
}

/// Snapshot-then-live protocol coordinator, shared by the listener's accept
/// loop and the orchestrator's dispatcher.
#[derive(Clone)]
pub struct BroadcastHub {
    seq: SeqAllocator,
    state: Arc<Mutex<HubState>>,
    next_client_id: Arc<std::sync::atomic::AtomicU64>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            seq: SeqAllocator::new(),
            state: Arc::new(Mutex::new(HubState {
                reconstruction: ReconstructionState::default(),
                tail: VecDeque::new(),
                tail_bytes: 0,
                clients: Vec::new(),
            })),
            next_client_id: Arc::new(std::sync::atomic::AtomicU64::new(1)),
        }
    }

    /// Broadcast one frame: assigns a sequence number, updates the
    /// reconstruction state, appends to the tail if replay-relevant, and
    /// fans out to every connected client (spec.md I5: "every broadcast
    /// frame is journaled before being sent to any client" — journaling is
    /// the caller's responsibility, via [`crate::lifecycle::Journal`],
    /// invoked before this method).
    pub fn broadcast(&self, tag: FrameTag, data: Option<Payload>) -> BroadcastFrame<Payload> {
        let frame = BroadcastFrame {
            seq: self.seq.next(),
            tag,
            data,
        };
        let encoded = wire::encode_line(&frame).unwrap_or_default();

        let mut state = self.state.lock();
        self.apply_reconstruction(&mut state.reconstruction, &frame);
        if tag.is_replay_relevant() {
            push_tail(&mut state.tail, &mut state.tail_bytes, &frame, encoded.len());
        }
        state.clients.retain(|c| c.tx.try_send(encoded.clone()).is_ok());
        frame
    }

    fn apply_reconstruction(&self, recon: &mut ReconstructionState, frame: &BroadcastFrame<Payload>) {
        match (&frame.tag, &frame.data) {
            (FrameTag::LoopStepStart, Some(Payload::LoopStep(p))) | (FrameTag::LoopStepEnd, Some(Payload::LoopStep(p))) => {
                recon.step = p.step.clone();
            }
            (FrameTag::Spawn, Some(Payload::Spawn(p))) => {
                recon.spawns = p.spawns.clone();
            }
            (FrameTag::Prompt, Some(Payload::Prompt(p))) => {
                recon.turn_summary = Some(p.text.clone());
            }
            (FrameTag::Done, _) => {
                recon.done = Some(frame.clone());
            }
            _ => {}
        }
    }

    /// Join protocol (spec.md §4.5.1): returns the meta frame, the snapshot
    /// frame, the `live` marker, and a [`ClientSink`] that begins receiving
    /// live frames from exactly `currentSeq + 1` — the snapshot build and
    /// client registration happen under the same lock so no frame is both
    /// in the snapshot and in the live tail.
    pub fn join(&self, meta: BroadcastFrame<Payload>) -> (BroadcastFrame<Payload>, BroadcastFrame<Payload>, BroadcastFrame<Payload>, ClientSink) {
        let mut state = self.state.lock();

        let (tail_frames, truncated) = trimmed_tail(&state.tail);
        let mut snapshot_payload = SnapshotPayload {
            loop_name: state.reconstruction.loop_name.clone(),
            step: state.reconstruction.step.clone(),
            turn_summary: state.reconstruction.turn_summary.clone(),
            spawns: state.reconstruction.spawns.clone(),
            tail: tail_frames,
            truncated,
        };
        // Second and third drop tiers (spec.md §4.5.1 "then large session
        // fields, then spawns"): only reached when the tail alone didn't
        // bring the snapshot under the wire cap.
        if encoded_len(&snapshot_payload) > SNAPSHOT_WIRE_CAP && snapshot_payload.turn_summary.is_some() {
            snapshot_payload.turn_summary = None;
            snapshot_payload.truncated = true;
        }
        if encoded_len(&snapshot_payload) > SNAPSHOT_WIRE_CAP && !snapshot_payload.spawns.is_empty() {
            snapshot_payload.spawns.clear();
            snapshot_payload.truncated = true;
        }
        let snapshot = BroadcastFrame {
            seq: self.seq.peek(),
            tag: FrameTag::Snapshot,
            data: Some(Payload::Snapshot(snapshot_payload)),
        };
        let live_marker = BroadcastFrame {
            seq: self.seq.peek(),
            tag: FrameTag::Live,
            data: None,
        };

        let id = self.next_client_id.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_DEPTH);
        // Registered under the same lock as the snapshot build (invariant:
        // watermark = currentSeq+1, gap-free and duplicate-free by
        // construction — spec.md §4.5.1).
        state.clients.push(ClientHandle { id, tx });

        let done_frame = state.reconstruction.done.clone();
        drop(state);

        if let Some(done) = done_frame {
            debug!(client = id, "daemon already finished, closing after snapshot");
            // Deliver terminal frame immediately; the listener closes the
            // connection once the channel drains and is dropped.
            self.unicast(id, &done);
        }

        (meta, snapshot, live_marker, ClientSink { id, rx })
    }

    fn unicast(&self, client_id: u64, frame: &BroadcastFrame<Payload>) {
        let encoded = match wire::encode_line(frame) {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "failed to encode unicast frame");
                return;
            }
        };
        let state = self.state.lock();
        if let Some(c) = state.clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.try_send(encoded);
        }
    }

    /// Remove a client (on socket error or disconnect).
    pub fn remove_client(&self, client_id: u64) {
        self.state.lock().clients.retain(|c| c.id != client_id);
    }

    pub fn client_count(&self) -> usize {
        self.state.lock().clients.len()
    }

    pub fn current_seq(&self) -> u64 {
        self.seq.peek()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

fn push_tail(tail: &mut VecDeque<TailEntry>, tail_bytes: &mut usize, frame: &BroadcastFrame<Payload>, encoded_len: usize) {
    tail.push_back(TailEntry {
        frame: frame.clone(),
        encoded_len,
    });
    *tail_bytes += encoded_len;

    while tail.len() > TAIL_MAX_FRAMES || *tail_bytes > TAIL_MAX_BYTES {
        if let Some(evicted) = tail.pop_front() {
            *tail_bytes -= evicted.encoded_len;
        } else {
            break;
        }
    }
}

/// Build the tail to ship in a snapshot, trimmed to [`SNAPSHOT_WIRE_CAP`] by
/// dropping the most recent frames first (spec.md §4.5.1 "drop recent
/// frames first, then large session fields, then spawns" — this function
/// implements the first drop tier; the caller trims session fields/spawns
/// if still over cap). The dropped recent frames are the ones about to
/// arrive again anyway via the live tail that starts at `currentSeq + 1`;
/// the oldest frames give the joining client context it would otherwise
/// have no way to recover.
fn trimmed_tail(tail: &VecDeque<TailEntry>) -> (Vec<BroadcastFrame<Payload>>, bool) {
    let mut total = 0usize;
    let mut kept: Vec<&TailEntry> = Vec::new();
    for entry in tail.iter() {
        if total + entry.encoded_len > SNAPSHOT_WIRE_CAP {
            break;
        }
        total += entry.encoded_len;
        kept.push(entry);
    }
    let truncated = kept.len() < tail.len();
    (kept.into_iter().map(|e| e.frame.clone()).collect(), truncated)
}

/// Approximate serialized size of a snapshot payload, used to decide
/// whether the second/third drop tiers (large session fields, then spawns)
/// are needed (spec.md §4.5.1).
fn encoded_len(payload: &SnapshotPayload) -> usize {
    serde_json::to_vec(payload).map(|v| v.len()).unwrap_or(0)
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
