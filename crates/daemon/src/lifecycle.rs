// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session daemon lifecycle (spec.md §4.5): config, filesystem layout
//! (§6.2), startup (bind socket, open journal, install signal handlers),
//! and shutdown. Grounded in `oj-daemon::lifecycle::{Config, startup}` and
//! `oj-daemon::main::setup_logging`.

use crate::hub::BroadcastHub;
use conclave_core::{Clock, SessionDescriptor, SessionId, SessionStatus, SystemClock};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no home directory available")]
    NoHomeDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("journal error: {0}")]
    Journal(#[from] crate::journal::JournalError),
    #[error("store error: {0}")]
    Store(#[from] conclave_store::StoreError),
}

/// Filesystem layout for one session under `<home>/<sessions-root>/<id>/`
/// (spec.md §6.2).
#[derive(Debug, Clone)]
pub struct SessionPaths {
    pub root: PathBuf,
    pub socket_path: PathBuf,
    pub meta_path: PathBuf,
    pub config_path: PathBuf,
    pub events_path: PathBuf,
    pub daemon_log_path: PathBuf,
}

impl SessionPaths {
    pub fn new(sessions_root: &Path, id: &SessionId) -> Self {
        let root = sessions_root.join(id.as_str());
        Self {
            socket_path: root.join("sock"),
            meta_path: root.join("meta.json"),
            config_path: root.join("config.json"),
            events_path: root.join("events.jsonl"),
            daemon_log_path: root.join("daemon.log"),
            root,
        }
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

/// Default sessions root: `~/.local/state/conclave/sessions` (or
/// `$XDG_STATE_HOME/conclave/sessions`), mirroring the teacher's
/// `oj-daemon::lifecycle::Config::load` / `OJ_STATE_DIR` convention.
pub fn default_sessions_root() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("CONCLAVE_STATE_DIR") {
        return Ok(PathBuf::from(dir).join("sessions"));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("conclave").join("sessions"));
    }
    let home = std::env::var_os("HOME").ok_or(LifecycleError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".local/state/conclave/sessions"))
}

/// Daemon bootstrap snapshot (`config.json`, spec.md §6.2): loop steps,
/// profiles snapshot, project dir, working dir, command overrides, max
/// cycles, resume session id, initial prompt. Kept as an opaque JSON value
/// here since its shape is owned by the loop-runtime collaborator (out of
/// scope, spec.md §1) — the daemon only needs to persist and reload it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DaemonConfig {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub working_dir: PathBuf,
    #[serde(default)]
    pub command_overrides: Vec<String>,
    #[serde(default)]
    pub max_cycles: Option<u64>,
    #[serde(default)]
    pub resume_session_id: Option<String>,
    #[serde(default)]
    pub initial_prompt: Option<String>,
    #[serde(default)]
    pub loop_definition: serde_json::Value,
}

/// Everything the daemon's main loop needs once startup has completed.
pub struct StartupResult {
    pub paths: SessionPaths,
    pub listener: UnixListener,
    pub descriptor: SessionDescriptor,
    pub journal: crate::journal::Journal,
    pub hub: BroadcastHub,
    pub shutdown: CancellationToken,
}

/// Start a session daemon: update the on-disk descriptor to `running` with
/// this process's pid, open the journal in append mode, bind the local
/// stream socket, and return a [`CancellationToken`] that installed
/// OS-signal handlers will cancel (spec.md §4.5 "installs OS-signal
/// handlers that cancel the loop context").
pub async fn startup(
    session_id: SessionId,
    config: DaemonConfig,
    sessions_root: &Path,
    clock: &impl Clock,
) -> Result<StartupResult, LifecycleError> {
    let paths = SessionPaths::new(sessions_root, &session_id);
    paths.ensure_dir()?;

    // Remove a stale socket from a crashed prior run before binding; a live
    // daemon would already hold the path and bind would fail with
    // AddrInUse, which is the correct behavior to surface.
    let _ = std::fs::remove_file(&paths.socket_path);
    let listener = UnixListener::bind(&paths.socket_path)?;

    std::fs::write(&paths.config_path, serde_json::to_vec_pretty(&config).unwrap_or_default())?;

    let mut descriptor = SessionDescriptor::new(
        session_id,
        config.project_name,
        config.loop_definition,
        paths.socket_path.clone(),
        paths.events_path.clone(),
        paths.daemon_log_path.clone(),
        clock.epoch_ms(),
    );
    descriptor.mark_running(std::process::id());

    let journal = crate::journal::Journal::open(&paths.events_path)?;
    let hub = BroadcastHub::new();
    let shutdown = CancellationToken::new();

    install_signal_handlers(shutdown.clone());

    info!(session = %descriptor.id.as_str(), socket = %paths.socket_path.display(), "session daemon ready");

    Ok(StartupResult {
        paths,
        listener,
        descriptor,
        journal,
        hub,
        shutdown,
    })
}

/// Install SIGTERM/SIGINT handlers that cancel `shutdown` (spec.md §4.5,
/// §5 "Cancellation semantics"). The session daemon classifies its own
/// signal-driven exit the same way as a canceled spawn so an OS signal
/// never surfaces as `error` in the session descriptor.
#[cfg(unix)]
fn install_signal_handlers(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGINT handler");
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = sigint.recv() => info!("received SIGINT"),
        }
        shutdown.cancel();
    });
}

#[cfg(not(unix))]
fn install_signal_handlers(_shutdown: CancellationToken) {}

/// Set up `tracing` to a non-blocking file appender over `daemon.log`,
/// matching `oj-daemon::main::setup_logging`.
pub fn setup_logging(log_path: &Path) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log"));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

pub type DefaultClock = SystemClock;

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
