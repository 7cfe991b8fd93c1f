// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `conclave start` - fork a detached session daemon for one project
//! (spec.md §4.6 supplemented feature), grounded in
//! `oj-cli::daemon_process::start_daemon_background` and
//! `oj-cli::client::DaemonClient::connect_with_retry`'s probe loop.

use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use conclave_core::{IdGen, SessionId, UuidIdGen};
use conclave_daemon::lifecycle::{self, DaemonConfig, SessionPaths};

use crate::daemon_process;

#[derive(Args)]
pub struct StartArgs {
    /// Project directory (a git worktree) the loop will run against.
    pub project_dir: PathBuf,

    /// Project name override (defaults to the directory's file name).
    #[arg(long)]
    pub name: Option<String>,

    /// Resume an earlier session's state instead of starting fresh.
    #[arg(long)]
    pub resume: Option<String>,

    /// Initial prompt text for the lead agent's first turn.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Path to a JSON file describing profiles, delegation rules, and
    /// agent commands (the opaque loop-runtime config, spec.md §6.2).
    #[arg(long)]
    pub loop_config: Option<PathBuf>,
}

pub async fn start(args: StartArgs) -> anyhow::Result<()> {
    let project_dir = args.project_dir.canonicalize()?;
    let project_name = args.name.unwrap_or_else(|| {
        project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    });

    let loop_definition = match args.loop_config {
        Some(path) => serde_json::from_slice(&std::fs::read(&path)?)?,
        None => serde_json::Value::Object(Default::default()),
    };

    let config = DaemonConfig {
        project_name,
        project_dir: project_dir.clone(),
        working_dir: project_dir,
        command_overrides: Vec::new(),
        max_cycles: None,
        resume_session_id: args.resume,
        initial_prompt: args.prompt,
        loop_definition,
    };

    let session_id = UuidIdGen.next();
    let config_path = std::env::temp_dir().join(format!("conclave-config-{session_id}.json"));
    std::fs::write(&config_path, serde_json::to_vec_pretty(&config)?)?;

    daemon_process::start_daemon_background(&session_id, &config_path)?;

    let sessions_root = lifecycle::default_sessions_root()?;
    let paths = SessionPaths::new(&sessions_root, &SessionId::new(session_id.clone()));

    let deadline = Instant::now() + conclave_client::timeout_connect();
    loop {
        if daemon_process::probe_socket(&paths.socket_path) {
            break;
        }
        if Instant::now() >= deadline {
            anyhow::bail!("timed out waiting for session {session_id} to start");
        }
        tokio::time::sleep(conclave_client::poll_interval()).await;
    }

    println!("session {session_id} started");
    println!("socket: {}", paths.socket_path.display());
    Ok(())
}
