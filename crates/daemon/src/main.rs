// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conclave session daemon (conclaved)
//!
//! Background process that owns exactly one session's orchestrator,
//! broadcast hub, and journal. One process per session, started by
//! `conclave-cli`'s `start` command and addressed thereafter over its
//! session's Unix socket.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use conclave_core::{DelegationEntry, DelegationRule, Profile, ProfileSet, SessionId, SystemClock};
use conclave_daemon::{env, lifecycle, DaemonConfig, Dispatcher, ListenCtx, Listener, ProcessBinding};
use conclave_orchestrator::{BindingRegistry, Orchestrator, VerbatimPromptBuilder};
use conclave_store::FileStore;
use conclave_workspace::WorkspaceManager;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::args().nth(1).as_deref() {
        Some("--version" | "-V" | "-v") => {
            println!("conclaved {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("--help" | "-h" | "help") => {
            print_help();
            return Ok(());
        }
        _ => {}
    }

    let session_id =
        SessionId::new(std::env::var("CONCLAVE_SESSION_ID").map_err(|_| "CONCLAVE_SESSION_ID must be set")?);
    let config_path = std::env::var("CONCLAVE_SESSION_CONFIG").map_err(|_| "CONCLAVE_SESSION_CONFIG must be set")?;
    let config: DaemonConfig = serde_json::from_slice(&std::fs::read(&config_path)?)?;

    let sessions_root = env::state_dir()
        .map(|d| d.join("sessions"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/conclave/sessions"));

    let clock = SystemClock;
    let startup = match lifecycle::startup(session_id.clone(), config.clone(), &sessions_root, &clock).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("conclaved: failed to start: {e}");
            return Err(e.into());
        }
    };

    let _log_guard = lifecycle::setup_logging(&startup.paths.daemon_log_path)?;
    info!(session = %session_id.as_str(), "conclaved starting");

    let store = Arc::new(FileStore::open(startup.paths.root.join("store.json"))?);
    let workspace = Arc::new(WorkspaceManager::new(
        &config.project_dir,
        startup.paths.root.join("worktrees"),
    ));

    let mut bindings = BindingRegistry::new();
    for (agent_type, argv) in agent_commands_from_config(&config) {
        bindings.register(agent_type, Arc::new(ProcessBinding::new(argv)));
    }

    let profiles = profiles_from_config(&config);
    let delegation_rules = delegation_rules_from_config(&config);

    let (event_tx, dispatcher) = Dispatcher::channel(startup.hub.clone(), startup.journal.clone());

    let orchestrator = Arc::new(Orchestrator::new(
        session_id.clone(),
        profiles,
        store,
        workspace,
        bindings,
        Arc::new(VerbatimPromptBuilder),
        clock,
        event_tx,
        env::review_interval_ms(),
    ));

    tokio::spawn(dispatcher.run());

    let ctx = Arc::new(ListenCtx {
        hub: startup.hub.clone(),
        orchestrator: Arc::clone(&orchestrator),
        delegation_rules,
        session_id: session_id.as_str().to_string(),
        profile: "lead".to_string(),
        agent: "claude".to_string(),
        project: config.project_name.clone(),
        loop_name: "main".to_string(),
        shutdown: startup.shutdown.clone(),
    });
    let listener = Listener::new(startup.listener, ctx);
    tokio::spawn(listener.run());

    info!(socket = %startup.paths.socket_path.display(), "conclaved ready");
    println!("READY");

    startup.shutdown.cancelled().await;
    info!("shutdown requested, cleaning up stale worktrees");

    let _ = orchestrator.cleanup_stale_worktrees(std::time::Duration::from_secs(24 * 3600)).await;
    let _ = std::fs::remove_file(&startup.paths.socket_path);
    info!("conclaved stopped");
    Ok(())
}

fn profiles_from_config(config: &DaemonConfig) -> ProfileSet {
    let mut profiles = ProfileSet::new();
    if let Some(obj) = config.loop_definition.get("profiles").and_then(|v| v.as_object()) {
        for (name, spec) in obj {
            let agent_type = spec.get("agent_type").and_then(|v| v.as_str()).unwrap_or("claude");
            profiles.insert(Profile::new(name.clone(), agent_type));
        }
    }
    if profiles.get("lead").is_none() {
        profiles.insert(Profile::new("lead", "claude"));
    }
    profiles
}

fn delegation_rules_from_config(config: &DaemonConfig) -> HashMap<String, DelegationRule> {
    let mut rules = HashMap::new();
    if let Some(obj) = config.loop_definition.get("delegation").and_then(|v| v.as_object()) {
        for (parent, spec) in obj {
            let entries: Vec<DelegationEntry> = spec
                .get("children")
                .and_then(|v| v.as_array())
                .map(|arr| arr.iter().filter_map(|v| v.as_str()).map(DelegationEntry::new).collect())
                .unwrap_or_default();
            if entries.is_empty() {
                continue;
            }
            let mut rule = DelegationRule::new(entries);
            if let Some(max) = spec.get("max_parallel").and_then(|v| v.as_u64()) {
                rule = rule.with_max_parallel(max as u32);
            }
            rules.insert(parent.clone(), rule);
        }
    }
    rules
}

/// `agent_type -> argv` command table, e.g. `{"claude": ["claude-agent", "--json"]}`.
/// Falls back to a single `echo`-style passthrough for `"claude"` only in the
/// absence of any configured agents, so a freshly started daemon can still
/// answer a control-request round trip during local testing.
fn agent_commands_from_config(config: &DaemonConfig) -> HashMap<String, Vec<String>> {
    let mut commands = HashMap::new();
    if let Some(obj) = config.loop_definition.get("agent_commands").and_then(|v| v.as_object()) {
        for (agent_type, argv) in obj {
            if let Some(argv) = argv.as_array() {
                let argv: Vec<String> = argv.iter().filter_map(|v| v.as_str().map(str::to_string)).collect();
                if !argv.is_empty() {
                    commands.insert(agent_type.clone(), argv);
                }
            }
        }
    }
    commands
}

fn print_help() {
    println!("conclaved {}", env!("CARGO_PKG_VERSION"));
    println!("Conclave session daemon — owns one session's orchestrator and Unix socket.");
    println!();
    println!("The daemon is started by the `conclave` CLI's `start` command and should");
    println!("not normally be invoked directly. Configuration is read from the path in");
    println!("CONCLAVE_SESSION_CONFIG; the session id is read from CONCLAVE_SESSION_ID.");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
}
