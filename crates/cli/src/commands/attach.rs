// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conclave attach` - join a running session's live frame stream
//! (spec.md §4.6), grounded in `oj-cli::client::DaemonClient` plus
//! `oj-cli`'s tmux-attach commands' "connect and stream until disconnect"
//! shape, adapted to this protocol's line-delimited JSON frames.

use clap::Args;
use conclave_client::AttachClient;
use conclave_core::SessionId;
use conclave_daemon::lifecycle::{self, SessionPaths};

#[derive(Args)]
pub struct AttachArgs {
    /// Session id to attach to.
    pub session_id: String,
}

pub async fn attach(args: AttachArgs) -> anyhow::Result<()> {
    let sessions_root = lifecycle::default_sessions_root()?;
    let paths = SessionPaths::new(&sessions_root, &SessionId::new(args.session_id.clone()));

    let mut client = AttachClient::connect(&paths.socket_path).await?;
    let (meta, snapshot) = client.join().await?;
    println!("session {} ({}/{}), step {}", meta.session_id, meta.project, meta.profile, meta.step_count);
    if let Some(summary) = &snapshot.turn_summary {
        println!("--- last turn summary ---\n{summary}");
    }
    if snapshot.truncated {
        println!("(reconnect snapshot truncated to fit the wire cap)");
    }
    for frame in &snapshot.tail {
        println!("{}", serde_json::to_string(frame)?);
    }
    println!("--- live ---");

    while let Some(frame) = client.next_frame().await? {
        println!("{}", serde_json::to_string(&frame)?);
    }
    println!("session disconnected");
    Ok(())
}
