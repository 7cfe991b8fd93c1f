// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! conclave - hierarchical agent orchestration CLI

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod daemon_process;
mod env;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::attach::{attach, AttachArgs};
use commands::control::{cancel, interrupt, spawn, CancelArgs, InterruptArgs, SpawnArgs};
use commands::start::{start, StartArgs};

#[derive(Parser)]
#[command(name = "conclave", version, about = "Hierarchical agent orchestration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a detached session daemon for a project.
    Start(StartArgs),
    /// Attach to a running session's live frame stream.
    Attach(AttachArgs),
    /// Spawn a child turn under a running session.
    Spawn(SpawnArgs),
    /// Cancel a running session.
    Cancel(CancelArgs),
    /// Interrupt a running spawn with a message.
    Interrupt(InterruptArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => start(args).await,
        Commands::Attach(args) => attach(args).await,
        Commands::Spawn(args) => spawn(args).await,
        Commands::Cancel(args) => cancel(args).await,
        Commands::Interrupt(args) => interrupt(args).await,
    }
}
