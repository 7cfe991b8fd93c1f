// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conclave spawn|cancel|interrupt` - one-shot control requests against a
//! running session (spec.md §4.5.2), grounded in `oj-cli::client`'s
//! request/response command shape.

use clap::Args;
use conclave_client::AttachClient;
use conclave_core::SessionId;
use conclave_daemon::lifecycle::{self, SessionPaths};
use conclave_daemon::wire::ControlRequest;

#[derive(Args)]
pub struct SpawnArgs {
    /// Session id to issue the request against.
    pub session_id: String,
    /// Turn id of the parent turn issuing this delegation.
    pub parent_turn_id: String,
    /// Profile name of the parent turn.
    pub parent_profile: String,
    /// Profile name to spawn the child under.
    pub child_profile: String,
    /// Task description handed to the child.
    pub task: String,
    /// Optional free-text role label for the child.
    #[arg(long)]
    pub role: Option<String>,
    /// Plan id the child should operate under, if any.
    #[arg(long)]
    pub plan_id: Option<String>,
    /// Give the child a read-only workspace.
    #[arg(long)]
    pub read_only: bool,
    /// Block until the child's turn has finished before returning.
    #[arg(long)]
    pub wait: bool,
    /// Reuse an existing spawn's workspace instead of creating a new one.
    #[arg(long)]
    pub workspace_from_spawn_id: Option<String>,
}

#[derive(Args)]
pub struct CancelArgs {
    /// Session id to cancel.
    pub session_id: String,
}

#[derive(Args)]
pub struct InterruptArgs {
    /// Session id the spawn belongs to.
    pub session_id: String,
    /// Spawn id to interrupt.
    pub spawn_id: String,
    /// Message delivered to the child in place of its next turn.
    pub message: String,
}

async fn connect(session_id: &str) -> anyhow::Result<AttachClient> {
    let sessions_root = lifecycle::default_sessions_root()?;
    let paths = SessionPaths::new(&sessions_root, &SessionId::new(session_id.to_string()));
    Ok(AttachClient::connect(&paths.socket_path).await?)
}

fn print_result(result: &conclave_daemon::wire::ControlResultPayload) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    if !result.ok {
        anyhow::bail!(result.error.clone().unwrap_or_else(|| "control request failed".to_string()));
    }
    Ok(())
}

pub async fn spawn(args: SpawnArgs) -> anyhow::Result<()> {
    let mut client = connect(&args.session_id).await?;
    let result = client
        .request(ControlRequest::Spawn {
            parent_turn_id: args.parent_turn_id,
            parent_profile: args.parent_profile,
            child_profile: args.child_profile,
            role: args.role,
            task: args.task,
            plan_id: args.plan_id,
            read_only: args.read_only,
            wait: args.wait,
            workspace_from_spawn_id: args.workspace_from_spawn_id,
        })
        .await?;
    print_result(&result)
}

pub async fn cancel(args: CancelArgs) -> anyhow::Result<()> {
    let mut client = connect(&args.session_id).await?;
    let result = client.request(ControlRequest::Cancel).await?;
    print_result(&result)
}

pub async fn interrupt(args: InterruptArgs) -> anyhow::Result<()> {
    let mut client = connect(&args.session_id).await?;
    let result = client
        .request(ControlRequest::InterruptSpawn {
            spawn_id: args.spawn_id,
            message: args.message,
        })
        .await?;
    print_result(&result)
}
