// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher (spec.md §4.5.3): fans out the orchestrator's shared event
//! channel to the [`BroadcastHub`] and the append-only journal.
//!
//! The non-blocking / closed-channel emit discipline itself lives on the
//! sender side, in `conclave_orchestrator::Orchestrator::emit` (unit-tested
//! there as `closed_channel_emit_is_a_silent_no_op`); this module only owns
//! the consumer half named in spec.md §4.5.3: "a single goroutine consumes
//! from the orchestrator's shared event channel... translates each into the
//! appropriate broadcast frame".

use crate::hub::BroadcastHub;
use crate::journal::Journal;
use crate::wire::{
    DonePayload, EventPayload, FinishedPayload, LoopDonePayload, LoopStepPayload, Payload, RawPayload,
    SpawnSetPayload, StartedPayload,
};
use conclave_core::{Event, FrameTag};
use tokio::sync::mpsc;

/// Capacity of the shared event channel between the orchestrator and the
/// dispatcher. Sized generously; a full channel means emits are dropped
/// (spec.md §4.5.3), not that delivery blocks.
pub const EVENT_CHANNEL_CAPACITY: usize = 4096;

pub struct Dispatcher {
    rx: mpsc::Receiver<Event>,
    hub: BroadcastHub,
    journal: Journal,
}

impl Dispatcher {
    /// Build the channel pair at daemon startup: the sender half is handed
    /// to `Orchestrator::new`'s `event_tx` parameter, the receiver half is
    /// driven by [`Dispatcher::run`] in a dedicated task.
    pub fn channel(hub: BroadcastHub, journal: Journal) -> (mpsc::Sender<Event>, Dispatcher) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        (tx, Dispatcher { rx, hub, journal })
    }

    /// Consume events until the sender side is dropped. A single task per
    /// session, matching spec.md §4.5.3 "a single goroutine consumes from
    /// the orchestrator's shared event channel".
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            let (tag, payload) = translate(event);
            self.journal.append(tag, payload.as_ref());
            self.hub.broadcast(tag, payload);
        }
    }
}

/// Translate an internal [`Event`] into the wire tag + typed payload the
/// hub broadcasts (spec.md §4.5.3 "passing typed payloads so the hub can
/// update its reconstruction state without re-parsing").
fn translate(event: Event) -> (FrameTag, Option<Payload>) {
    match event {
        Event::AgentStarted {
            session_id,
            turn_id,
            step_id,
            run_id,
        } => (
            FrameTag::Started,
            Some(Payload::Started(StartedPayload {
                session_id: session_id.to_string(),
                turn_id: turn_id.to_string(),
                step_id,
                run_id,
            })),
        ),
        Event::AgentPrompt {
            session_id,
            turn_id,
            text,
            is_resume,
            truncated,
            original_length,
        } => (
            FrameTag::Prompt,
            Some(Payload::Prompt(crate::wire::PromptPayload {
                session_id: session_id.to_string(),
                turn_id: turn_id.to_string(),
                text,
                is_resume,
                truncated,
                original_length,
            })),
        ),
        Event::AgentFinished {
            turn_id,
            exit_code,
            duration_ms,
            wait_for_spawns,
            error,
        } => (
            FrameTag::Finished,
            Some(Payload::Finished(FinishedPayload {
                turn_id: turn_id.to_string(),
                exit_code,
                duration_ns: duration_ms.saturating_mul(1_000_000),
                wait_for_spawns,
                error,
            })),
        ),
        Event::AgentRaw { turn_id, spawn_id, text } => (
            FrameTag::Raw,
            Some(Payload::Raw(RawPayload {
                turn_id: turn_id.map(|t| t.to_string()),
                spawn_id: spawn_id.map(|s| s.to_string()),
                text,
            })),
        ),
        Event::AgentEvent {
            turn_id,
            spawn_id,
            event,
            raw,
        } => (
            FrameTag::Event,
            Some(Payload::Event(EventPayload {
                event,
                raw,
                spawn_id: spawn_id.map(|s| s.to_string()),
                turn_id: turn_id.map(|t| t.to_string()),
            })),
        ),
        Event::SpawnStatusChanged { spawns } => (FrameTag::Spawn, Some(Payload::Spawn(SpawnSetPayload { spawns }))),
        Event::LoopStepStart { step } => (FrameTag::LoopStepStart, Some(Payload::LoopStep(LoopStepPayload { step }))),
        Event::LoopStepEnd { step } => (FrameTag::LoopStepEnd, Some(Payload::LoopStep(LoopStepPayload { step }))),
        Event::LoopDone { reason, error } => (
            FrameTag::LoopDone,
            Some(Payload::LoopDone(LoopDonePayload { reason, error })),
        ),
        Event::Done { error } => (FrameTag::Done, Some(Payload::Done(DonePayload { error }))),
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
