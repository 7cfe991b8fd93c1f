// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol (spec.md §6.1): one UTF-8 line per frame, newline
//! terminated, body `{"type": <tag>, "data": <payload>}`. Deliberately
//! line-delimited JSON rather than the teacher's 4-byte length-prefixed
//! framing (`oj-daemon::protocol_wire`) because spec.md §6.1 specifies
//! line framing explicitly; the length-prefix *technique* survives as the
//! max-line-length guard below.

use conclave_core::{BroadcastFrame, FrameTag};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

/// Maximum line length accepted from either peer (200 MiB), guarding
/// against a runaway write filling the socket buffer.
pub const MAX_LINE_SIZE: usize = 200 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line too large: {size} bytes (max {max})")]
    LineTooLarge { size: usize, max: usize },
    #[error("connection closed")]
    ConnectionClosed,
}

/// D→C data-bearing payloads, one variant per tag that carries a `data`
/// field (spec.md §6.1 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Meta(MetaPayload),
    Snapshot(SnapshotPayload),
    Started(StartedPayload),
    Prompt(PromptPayload),
    Event(EventPayload),
    Raw(RawPayload),
    Finished(FinishedPayload),
    Spawn(SpawnSetPayload),
    LoopStep(LoopStepPayload),
    LoopDone(LoopDonePayload),
    Done(DonePayload),
    Control(ControlRequest),
    ControlResult(ControlResultPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaPayload {
    pub session_id: String,
    pub profile: String,
    pub agent: String,
    pub project: String,
    pub loop_name: String,
    pub step_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub loop_name: String,
    pub step: String,
    pub turn_summary: Option<String>,
    pub spawns: Vec<conclave_core::SpawnSnapshot>,
    pub tail: Vec<BroadcastFrame<Payload>>,
    /// Set when the reconnect snapshot had to be trimmed to fit the wire
    /// cap (spec.md §4.5.1 "trimmed to fit a wire cap").
    pub truncated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartedPayload {
    pub session_id: String,
    pub turn_id: String,
    pub step_id: String,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptPayload {
    pub session_id: String,
    pub turn_id: String,
    pub text: String,
    pub is_resume: bool,
    pub truncated: bool,
    pub original_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub event: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedPayload {
    pub turn_id: String,
    pub exit_code: i32,
    pub duration_ns: u64,
    pub wait_for_spawns: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSetPayload {
    pub spawns: Vec<conclave_core::SpawnSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopStepPayload {
    pub step: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopDonePayload {
    pub reason: conclave_core::LoopDoneReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// C→D control requests (spec.md §4.5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlRequest {
    Spawn {
        parent_turn_id: String,
        parent_profile: String,
        child_profile: String,
        #[serde(default)]
        role: Option<String>,
        task: String,
        #[serde(default)]
        plan_id: Option<String>,
        #[serde(default)]
        read_only: bool,
        #[serde(default)]
        wait: bool,
        #[serde(default)]
        workspace_from_spawn_id: Option<String>,
    },
    Wait {
        turn_id: String,
    },
    InterruptSpawn {
        spawn_id: String,
        message: String,
    },
    Cancel,
}

/// D→C reply to exactly one control request (spec.md §4.5.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlResultPayload {
    pub action: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// The bare `cancel` line (spec.md §6.1: "Bare single-word line").
pub const CANCEL_LINE: &str = "cancel";

pub fn encode_line<T: Serialize>(frame: &BroadcastFrame<T>) -> Result<String, ProtocolError> {
    let mut s = serde_json::to_string(frame)?;
    s.push('\n');
    Ok(s)
}

pub fn decode_line<T: for<'de> Deserialize<'de>>(line: &str) -> Result<BroadcastFrame<T>, ProtocolError> {
    Ok(serde_json::from_str(line.trim_end())?)
}

/// Decode a tag-only control envelope without knowing `T` up front
/// (used by the listener to branch on `tag` before picking a payload type).
#[derive(Debug, Clone, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub tag: FrameTag,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

pub async fn read_line<R: AsyncBufReadExt + Unpin>(reader: &mut R) -> Result<Option<String>, ProtocolError> {
    let mut buf = String::new();
    let n = reader.read_line(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if buf.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::LineTooLarge {
            size: buf.len(),
            max: MAX_LINE_SIZE,
        });
    }
    Ok(Some(buf))
}

pub async fn write_line<W: AsyncWriteExt + Unpin>(writer: &mut W, line: &str) -> Result<(), ProtocolError> {
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
