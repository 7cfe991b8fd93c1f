// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::wire::{ControlRequest, Payload, RawEnvelope};
use conclave_core::{
    BroadcastFrame, DelegationEntry, DelegationRule, FakeClock, FrameTag, Profile, ProfileSet, SessionId,
};
use conclave_orchestrator::{BindingRegistry, ChildAgentBinding, ChildLoopConfig, ChildOutcome, VerbatimPromptBuilder};
use conclave_store::MemoryStore;
use conclave_workspace::WorkspaceManager;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{UnixListener as TokioUnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = std::process::Command::new("git").args(args).current_dir(dir).status().unwrap();
    assert!(status.success());
}

async fn init_repo() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.email", "test@example.com"]);
    git(dir.path(), &["config", "user.name", "Test"]);
    std::fs::write(dir.path().join("README.md"), "hi\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-q", "-m", "initial"]);
    dir
}

struct InstantBinding;

#[async_trait::async_trait]
impl ChildAgentBinding for InstantBinding {
    async fn run(&self, _config: &ChildLoopConfig, _cancel: CancellationToken, raw_tx: mpsc::UnboundedSender<String>) -> ChildOutcome {
        let _ = raw_tx.send(r#"{"role":"assistant","content":"done reviewing"}"#.to_string());
        ChildOutcome {
            exit_code: Some(0),
            canceled: false,
            error: None,
        }
    }
}

async fn test_ctx(repo: &TempDir) -> Arc<ListenCtx<FakeClock>> {
    let store = Arc::new(MemoryStore::new());
    let workspace = Arc::new(WorkspaceManager::new(repo.path(), repo.path().join(".conclave")));
    let mut bindings = BindingRegistry::new();
    bindings.register("claude", Arc::new(InstantBinding) as Arc<dyn ChildAgentBinding>);
    let mut profiles = ProfileSet::new();
    profiles.insert(Profile::new("lead", "claude"));
    profiles.insert(Profile::new("reviewer", "claude"));
    let (tx, _rx) = mpsc::channel(64);
    let orchestrator = Arc::new(conclave_orchestrator::Orchestrator::new(
        SessionId::new("s1"),
        profiles,
        store,
        workspace,
        bindings,
        Arc::new(VerbatimPromptBuilder),
        FakeClock::new(),
        tx,
        None,
    ));

    let mut delegation_rules = std::collections::HashMap::new();
    delegation_rules.insert(
        "lead".to_string(),
        DelegationRule::new(vec![DelegationEntry::new("reviewer")]).with_max_parallel(4),
    );

    Arc::new(ListenCtx {
        hub: BroadcastHub::new(),
        orchestrator,
        delegation_rules,
        session_id: "s1".to_string(),
        profile: "lead".to_string(),
        agent: "claude".to_string(),
        project: "demo".to_string(),
        loop_name: "main".to_string(),
        shutdown: CancellationToken::new(),
    })
}

#[tokio::test]
async fn client_receives_meta_snapshot_live_then_control_result() {
    let repo = init_repo().await;
    let ctx = test_ctx(&repo).await;

    let socket_dir = tempfile::tempdir().unwrap();
    let socket_path = socket_dir.path().join("sock");
    let listener = TokioUnixListener::bind(&socket_path).unwrap();
    let daemon_listener = Listener::new(listener, ctx);
    tokio::spawn(daemon_listener.run());

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    let frame: BroadcastFrame<Payload> = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(frame.tag, FrameTag::Meta);

    line.clear();
    reader.read_line(&mut line).await.unwrap();
    let frame: BroadcastFrame<Payload> = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(frame.tag, FrameTag::Snapshot);

    line.clear();
    reader.read_line(&mut line).await.unwrap();
    let frame: BroadcastFrame<Payload> = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(frame.tag, FrameTag::Live);

    let control = ControlRequest::Spawn {
        parent_turn_id: "t1".to_string(),
        parent_profile: "lead".to_string(),
        child_profile: "reviewer".to_string(),
        role: None,
        task: "review this diff".to_string(),
        plan_id: None,
        read_only: true,
        wait: true,
        workspace_from_spawn_id: None,
    };
    let envelope = serde_json::json!({"type": "control", "data": control});
    let mut out = serde_json::to_string(&envelope).unwrap();
    out.push('\n');
    use tokio::io::AsyncWriteExt;
    write_half.write_all(out.as_bytes()).await.unwrap();
    write_half.flush().await.unwrap();

    line.clear();
    let n = tokio::time::timeout(std::time::Duration::from_secs(5), reader.read_line(&mut line))
        .await
        .unwrap()
        .unwrap();
    assert!(n > 0);
    let env: RawEnvelope = serde_json::from_str(line.trim_end()).unwrap();
    assert_eq!(env.tag, FrameTag::ControlResult);
}

#[tokio::test]
async fn bare_cancel_line_cancels_shutdown_token() {
    let repo = init_repo().await;
    let ctx = test_ctx(&repo).await;
    let shutdown = ctx.shutdown.clone();

    let socket_dir = tempfile::tempdir().unwrap();
    let socket_path = socket_dir.path().join("sock");
    let listener = TokioUnixListener::bind(&socket_path).unwrap();
    let daemon_listener = Listener::new(listener, ctx);
    tokio::spawn(daemon_listener.run());

    let stream = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    for _ in 0..3 {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
    }

    use tokio::io::AsyncWriteExt;
    write_half.write_all(b"cancel\n").await.unwrap();
    write_half.flush().await.unwrap();

    tokio::time::timeout(std::time::Duration::from_secs(2), shutdown.cancelled())
        .await
        .unwrap();
}
