// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Internal lifecycle events multiplexed onto the orchestrator's shared
//! event channel and fanned out by the Dispatcher (spec.md §4.5.3).

use crate::owner::TurnId;
use crate::session::SessionId;
use crate::spawn::{SpawnId, SpawnStatus};
use serde::{Deserialize, Serialize};

/// Why a loop stopped (spec.md §6.1 `loop_done` tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopDoneReason {
    Stopped,
    Cancelled,
    Error,
}

/// Lightweight spawn snapshot carried in `SpawnSetChanged` / the hub's
/// reconstruction state, so clients needn't replay the full record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSnapshot {
    pub id: SpawnId,
    pub child_profile: String,
    pub role: Option<String>,
    pub status: SpawnStatus,
}

/// Events multiplexed onto the shared event channel that the Dispatcher
/// translates into broadcast frames (spec.md §4.5.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A turn (loop step driving a child agent process) started.
    AgentStarted {
        session_id: SessionId,
        turn_id: TurnId,
        step_id: String,
        run_id: String,
    },
    /// The prompt assembled for a turn.
    AgentPrompt {
        session_id: SessionId,
        turn_id: TurnId,
        text: String,
        is_resume: bool,
        truncated: bool,
        original_length: usize,
    },
    /// A turn's child process exited.
    AgentFinished {
        turn_id: TurnId,
        exit_code: i32,
        duration_ms: u64,
        wait_for_spawns: bool,
        error: Option<String>,
    },
    /// Raw (non-structured) output chunk from a child agent.
    AgentRaw {
        turn_id: Option<TurnId>,
        spawn_id: Option<SpawnId>,
        text: String,
    },
    /// A parsed structured event line from a child agent's stream.
    AgentEvent {
        turn_id: Option<TurnId>,
        spawn_id: Option<SpawnId>,
        event: serde_json::Value,
        raw: Option<String>,
    },
    /// The current spawn set changed (a spawn started, or changed status).
    SpawnStatusChanged { spawns: Vec<SpawnSnapshot> },
    LoopStepStart { step: String },
    LoopStepEnd { step: String },
    LoopDone {
        reason: LoopDoneReason,
        error: Option<String>,
    },
    /// The session itself ended.
    Done { error: Option<String> },
}

impl Event {
    /// Short tag for structured logging, mirroring the teacher's
    /// `Effect::name()` convention.
    pub fn name(&self) -> &'static str {
        match self {
            Event::AgentStarted { .. } => "agent_started",
            Event::AgentPrompt { .. } => "agent_prompt",
            Event::AgentFinished { .. } => "agent_finished",
            Event::AgentRaw { .. } => "agent_raw",
            Event::AgentEvent { .. } => "agent_event",
            Event::SpawnStatusChanged { .. } => "spawn_status_changed",
            Event::LoopStepStart { .. } => "loop_step_start",
            Event::LoopStepEnd { .. } => "loop_step_end",
            Event::LoopDone { .. } => "loop_done",
            Event::Done { .. } => "done",
        }
    }

    /// One-line summary for log spans; avoids dumping large payloads
    /// (prompt text, raw agent output) into structured logs.
    pub fn log_summary(&self) -> String {
        match self {
            Event::AgentStarted { turn_id, .. } => format!("turn={turn_id}"),
            Event::AgentPrompt {
                turn_id,
                original_length,
                ..
            } => format!("turn={turn_id} len={original_length}"),
            Event::AgentFinished {
                turn_id, exit_code, ..
            } => format!("turn={turn_id} exit={exit_code}"),
            Event::AgentRaw { spawn_id, text, .. } => {
                format!("spawn={spawn_id:?} bytes={}", text.len())
            }
            Event::AgentEvent { spawn_id, .. } => format!("spawn={spawn_id:?}"),
            Event::SpawnStatusChanged { spawns } => format!("count={}", spawns.len()),
            Event::LoopStepStart { step } | Event::LoopStepEnd { step } => step.clone(),
            Event::LoopDone { reason, .. } => format!("{reason:?}"),
            Event::Done { error } => format!("error={}", error.is_some()),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
