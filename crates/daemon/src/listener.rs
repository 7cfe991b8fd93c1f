// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener: accepts connections on the session's local stream socket,
//! drives the join protocol (spec.md §4.5.1) per connection, and answers
//! control requests (spec.md §4.5.2) by calling into the orchestrator.
//! Grounded in `oj-daemon::listener::Listener`'s "accept, spawn a task per
//! connection, never block the engine loop" shape.

use crate::hub::BroadcastHub;
use crate::wire::{self, ControlRequest, ControlResultPayload, MetaPayload, Payload, ProtocolError, RawEnvelope};
use conclave_core::{Clock, DelegationRule, FrameTag, SpawnId, SpawnRequest, TurnId};
use conclave_orchestrator::Orchestrator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

/// Shared per-connection context (spec.md §4.5 "the daemon... answers
/// control RPCs").
pub struct ListenCtx<C: Clock> {
    pub hub: BroadcastHub,
    pub orchestrator: Arc<Orchestrator<C>>,
    pub delegation_rules: HashMap<String, DelegationRule>,
    pub session_id: String,
    pub profile: String,
    pub agent: String,
    pub project: String,
    pub loop_name: String,
    pub shutdown: tokio_util::sync::CancellationToken,
}

pub struct Listener<C: Clock> {
    socket: UnixListener,
    ctx: Arc<ListenCtx<C>>,
}

impl<C: Clock + 'static> Listener<C> {
    pub fn new(socket: UnixListener, ctx: Arc<ListenCtx<C>>) -> Self {
        Self { socket, ctx }
    }

    /// Accept loop; runs until the process exits. Each connection is
    /// handled in its own task so one slow client never blocks another
    /// (spec.md §4.5.1 "Per-client delivery").
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ctx).await {
                            match e {
                                ProtocolError::ConnectionClosed => debug!("client disconnected"),
                                other => warn!(error = %other, "connection error"),
                            }
                        }
                    });
                }
                Err(e) => error!(error = %e, "accept error"),
            }
        }
    }
}

async fn handle_connection<C: Clock + 'static>(stream: UnixStream, ctx: Arc<ListenCtx<C>>) -> Result<(), ProtocolError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let meta = conclave_core::BroadcastFrame {
        seq: 0,
        tag: FrameTag::Meta,
        data: Some(Payload::Meta(MetaPayload {
            session_id: ctx.session_id.clone(),
            profile: ctx.profile.clone(),
            agent: ctx.agent.clone(),
            project: ctx.project.clone(),
            loop_name: ctx.loop_name.clone(),
            step_count: ctx.hub.current_seq(),
        })),
    };

    let (meta_frame, snapshot_frame, live_frame, mut sink) = ctx.hub.join(meta);

    wire::write_line(&mut write_half, &wire::encode_line(&meta_frame)?).await?;
    wire::write_line(&mut write_half, &wire::encode_line(&snapshot_frame)?).await?;
    wire::write_line(&mut write_half, &wire::encode_line(&live_frame)?).await?;

    let client_id = sink.id;
    let result = loop {
        tokio::select! {
            line = wire::read_line(&mut reader) => {
                match line {
                    Ok(Some(line)) => {
                        if let Err(e) = handle_client_line(&line, &ctx, &mut write_half).await {
                            break Err(e);
                        }
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            frame = sink.rx.recv() => {
                match frame {
                    Some(line) => {
                        if let Err(e) = wire::write_line(&mut write_half, &line).await {
                            break Err(ProtocolError::Io(e));
                        }
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    ctx.hub.remove_client(client_id);
    result
}

async fn handle_client_line<C: Clock + 'static>(
    line: &str,
    ctx: &Arc<ListenCtx<C>>,
    write_half: &mut (impl tokio::io::AsyncWrite + Unpin),
) -> Result<(), ProtocolError> {
    let trimmed = line.trim();
    if trimmed == wire::CANCEL_LINE {
        ctx.shutdown.cancel();
        return Ok(());
    }

    let envelope: RawEnvelope = match serde_json::from_str(trimmed) {
        Ok(e) => e,
        Err(e) => return Err(ProtocolError::Json(e)),
    };
    if envelope.tag != FrameTag::Control {
        return Ok(());
    }
    let Some(data) = envelope.data else {
        return Ok(());
    };
    let request: ControlRequest = serde_json::from_value(data)?;

    let result = dispatch_control(request, ctx).await;
    let frame = conclave_core::BroadcastFrame {
        seq: ctx.hub.current_seq(),
        tag: FrameTag::ControlResult,
        data: Some(Payload::ControlResult(result)),
    };
    wire::write_line(write_half, &wire::encode_line(&frame)?).await
}

async fn dispatch_control<C: Clock + 'static>(request: ControlRequest, ctx: &Arc<ListenCtx<C>>) -> ControlResultPayload {
    match request {
        ControlRequest::Spawn {
            parent_turn_id,
            parent_profile,
            child_profile,
            role,
            task,
            plan_id,
            read_only,
            wait,
            workspace_from_spawn_id,
        } => handle_spawn(
            ctx,
            parent_turn_id,
            parent_profile,
            child_profile,
            role,
            task,
            plan_id,
            read_only,
            wait,
            workspace_from_spawn_id,
        )
        .await,
        ControlRequest::Wait { turn_id: _ } => {
            // Turn-level wait wakeup: the parent loop observes completion
            // via the store directly (spec.md §4.5.2 "used by the parent
            // loop to notify child-completion via the store"); the daemon
            // only acknowledges the signal here.
            ControlResultPayload {
                action: "wait".to_string(),
                ok: true,
                error: None,
                spawn_id: None,
                status: None,
                exit_code: None,
                result: None,
            }
        }
        ControlRequest::InterruptSpawn { spawn_id, message } => {
            let parsed = match spawn_id.parse::<u64>() {
                Ok(id) => SpawnId(id),
                Err(_) => {
                    return ControlResultPayload {
                        action: "interrupt_spawn".to_string(),
                        ok: false,
                        error: Some("invalid spawn id".to_string()),
                        spawn_id: None,
                        status: None,
                        exit_code: None,
                        result: None,
                    }
                }
            };
            match ctx.orchestrator.interrupt_spawn(parsed, &message).await {
                Ok(()) => ControlResultPayload {
                    action: "interrupt_spawn".to_string(),
                    ok: true,
                    error: None,
                    spawn_id: Some(spawn_id),
                    status: None,
                    exit_code: None,
                    result: None,
                },
                Err(e) => ControlResultPayload {
                    action: "interrupt_spawn".to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                    spawn_id: Some(spawn_id),
                    status: None,
                    exit_code: None,
                    result: None,
                },
            }
        }
        ControlRequest::Cancel => {
            ctx.shutdown.cancel();
            ControlResultPayload {
                action: "cancel".to_string(),
                ok: true,
                error: None,
                spawn_id: None,
                status: None,
                exit_code: None,
                result: None,
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_spawn<C: Clock + 'static>(
    ctx: &Arc<ListenCtx<C>>,
    parent_turn_id: String,
    parent_profile: String,
    child_profile: String,
    role: Option<String>,
    task: String,
    plan_id: Option<String>,
    read_only: bool,
    wait: bool,
    workspace_from_spawn_id: Option<String>,
) -> ControlResultPayload {
    let Some(delegation_rule) = ctx.delegation_rules.get(&parent_profile).cloned() else {
        return ControlResultPayload {
            action: "spawn".to_string(),
            ok: false,
            error: Some(format!("no delegation rule configured for profile {parent_profile}")),
            spawn_id: None,
            status: None,
            exit_code: None,
            result: None,
        };
    };

    let workspace_from_spawn_id = match workspace_from_spawn_id.as_deref().map(|s| s.parse::<u64>()) {
        Some(Ok(id)) => Some(SpawnId(id)),
        Some(Err(_)) => {
            return ControlResultPayload {
                action: "spawn".to_string(),
                ok: false,
                error: Some("invalid workspace_from_spawn_id".to_string()),
                spawn_id: None,
                status: None,
                exit_code: None,
                result: None,
            }
        }
        None => None,
    };

    let request = SpawnRequest {
        parent_turn_id: TurnId(parent_turn_id),
        parent_spawn_id: None,
        parent_profile,
        child_profile,
        requested_role: role,
        task_text: task,
        plan_id,
        read_only,
        wait,
        workspace_from_spawn_id,
        delegation_rule,
    };

    match ctx.orchestrator.spawn(request).await {
        Ok(spawn_id) => {
            info!(spawn_id = %spawn_id, "spawn admitted via control request");
            if wait {
                match ctx.orchestrator.wait_one(spawn_id).await {
                    Ok(record) => ControlResultPayload {
                        action: "spawn".to_string(),
                        ok: true,
                        error: None,
                        spawn_id: Some(spawn_id.to_string()),
                        status: Some(record.status.to_string()),
                        exit_code: record.exit_code,
                        result: record.result,
                    },
                    Err(e) => ControlResultPayload {
                        action: "spawn".to_string(),
                        ok: false,
                        error: Some(e.to_string()),
                        spawn_id: Some(spawn_id.to_string()),
                        status: None,
                        exit_code: None,
                        result: None,
                    },
                }
            } else {
                ControlResultPayload {
                    action: "spawn".to_string(),
                    ok: true,
                    error: None,
                    spawn_id: Some(spawn_id.to_string()),
                    status: None,
                    exit_code: None,
                    result: None,
                }
            }
        }
        Err(e) => ControlResultPayload {
            action: "spawn".to_string(),
            ok: false,
            error: Some(e.to_string()),
            spawn_id: None,
            status: None,
            exit_code: None,
            result: None,
        },
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
