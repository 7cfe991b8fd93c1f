// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed [`ChildAgentBinding`]: runs a configured command as a
//! child process, writes the prompt to its stdin, and streams stdout lines
//! into the raw sink until it exits or the spawn is canceled. Grounded in
//! the teacher's `oj-adapters::subprocess::run_with_timeout` command-wrapping
//! discipline, generalized from one-shot output capture to a long-lived,
//! line-streamed, cancelable child process.

use async_trait::async_trait;
use conclave_orchestrator::{ChildAgentBinding, ChildLoopConfig, ChildOutcome};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Runs `argv[0] argv[1..]` in `config.cwd`, feeding `config.prompt` on
/// stdin and forwarding stdout lines verbatim to `raw_tx`.
pub struct ProcessBinding {
    argv: Vec<String>,
}

impl ProcessBinding {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

#[async_trait]
impl ChildAgentBinding for ProcessBinding {
    async fn run(&self, config: &ChildLoopConfig, cancel: CancellationToken, raw_tx: mpsc::UnboundedSender<String>) -> ChildOutcome {
        let Some((program, args)) = self.argv.split_first() else {
            return ChildOutcome {
                exit_code: None,
                canceled: false,
                error: Some("no command configured for this agent type".to_string()),
            };
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&config.cwd)
            .envs(config.extra_env.iter().cloned())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match command.spawn() {
            Ok(c) => c,
            Err(e) => {
                return ChildOutcome {
                    exit_code: None,
                    canceled: false,
                    error: Some(format!("failed to spawn {program}: {e}")),
                }
            }
        };

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(config.prompt.as_bytes()).await {
                warn!(error = %e, "failed to write prompt to child stdin");
            }
        }

        let mut lines = child.stdout.take().map(|s| BufReader::new(s).lines());

        while let Some(reader) = lines.as_mut() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    return ChildOutcome { exit_code: None, canceled: true, error: None };
                }
                line = reader.next_line() => {
                    match line {
                        Ok(Some(text)) => {
                            let _ = raw_tx.send(text);
                        }
                        Ok(None) => lines = None,
                        Err(e) => {
                            warn!(error = %e, "error reading child stdout");
                            lines = None;
                        }
                    }
                }
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                ChildOutcome { exit_code: None, canceled: true, error: None }
            }
            status = child.wait() => match status {
                Ok(status) => ChildOutcome { exit_code: status.code(), canceled: false, error: None },
                Err(e) => ChildOutcome {
                    exit_code: None,
                    canceled: false,
                    error: Some(format!("failed to wait on child: {e}")),
                },
            },
        }
    }
}

#[cfg(test)]
#[path = "process_binding_tests.rs"]
mod tests;
