// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use conclave_core::{DelegationEntry, DelegationRule, FakeClock, Profile, ProfileSet, SessionId};
use conclave_daemon::wire::ControlRequest;
use conclave_daemon::{BroadcastHub, Dispatcher, Journal, ListenCtx, Listener};
use conclave_orchestrator::{BindingRegistry, ChildAgentBinding, ChildLoopConfig, ChildOutcome, Orchestrator, VerbatimPromptBuilder};
use conclave_store::MemoryStore;
use conclave_workspace::WorkspaceManager;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::UnixListener as TokioUnixListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = std::process::Command::new("git").args(args).current_dir(dir).status().unwrap();
    assert!(status.success());
}

async fn init_repo() -> tempfile::TempDir {
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
        let _ = raw_tx.send(r#"{"role":"assistant","content":"done"}"#.to_string());
        ChildOutcome {
            exit_code: Some(0),
            canceled: false,
            error: None,
        }
    }
}

async fn spawn_daemon(repo: &tempfile::TempDir) -> PathBuf {
    let store = Arc::new(MemoryStore::new());
    let workspace = Arc::new(WorkspaceManager::new(repo.path(), repo.path().join(".conclave")));
    let mut bindings = BindingRegistry::new();
    bindings.register("claude", Arc::new(InstantBinding) as Arc<dyn ChildAgentBinding>);
    let mut profiles = ProfileSet::new();
    profiles.insert(Profile::new("lead", "claude"));
    profiles.insert(Profile::new("reviewer", "claude"));

    let hub = BroadcastHub::new();
    let journal_path = repo.path().join("events.jsonl");
    let journal = Journal::open(&journal_path).unwrap();
    let (event_tx, dispatcher) = Dispatcher::channel(hub.clone(), journal);

    let orchestrator = Arc::new(Orchestrator::new(
        SessionId::new("s1"),
        profiles,
        store,
        workspace,
        bindings,
        Arc::new(VerbatimPromptBuilder),
        FakeClock::new(),
        event_tx,
        None,
    ));
    tokio::spawn(dispatcher.run());

    let mut delegation_rules = std::collections::HashMap::new();
    delegation_rules.insert(
        "lead".to_string(),
        DelegationRule::new(vec![DelegationEntry::new("reviewer")]).with_max_parallel(4),
    );

    let ctx = Arc::new(ListenCtx {
        hub,
        orchestrator,
        delegation_rules,
        session_id: "s1".to_string(),
        profile: "lead".to_string(),
        agent: "claude".to_string(),
        project: "demo".to_string(),
        loop_name: "main".to_string(),
        shutdown: CancellationToken::new(),
    });

    let socket_path = repo.path().join("sock");
    let listener = TokioUnixListener::bind(&socket_path).unwrap();
    tokio::spawn(Listener::new(listener, ctx).run());
    socket_path
}

#[tokio::test]
async fn join_returns_meta_and_snapshot_then_spawn_request_round_trips() {
    let repo = init_repo().await;
    let socket_path = spawn_daemon(&repo).await;

    let mut client = AttachClient::connect(&socket_path).await.unwrap();
    let (meta, snapshot) = client.join().await.unwrap();
    assert_eq!(meta.session_id, "s1");
    assert_eq!(meta.project, "demo");
    assert!(!snapshot.truncated);

    let result = client
        .request(ControlRequest::Spawn {
            parent_turn_id: "t1".to_string(),
            parent_profile: "lead".to_string(),
            child_profile: "reviewer".to_string(),
            role: None,
            task: "review this diff".to_string(),
            plan_id: None,
            read_only: true,
            wait: true,
            workspace_from_spawn_id: None,
        })
        .await
        .unwrap();

    assert!(result.ok);
    assert_eq!(result.status.as_deref(), Some("completed"));
}

#[tokio::test]
async fn connect_to_missing_socket_reports_daemon_not_running() {
    let dir = tempfile::tempdir().unwrap();
    let err = AttachClient::connect(&dir.path().join("nonexistent")).await.unwrap_err();
    assert!(matches!(err, ClientError::DaemonNotRunning(_)));
}
