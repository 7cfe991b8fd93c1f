// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child agent bindings: a capability-style registry so the orchestrator
//! depends only on "start a prompt-driven child process and emit structured
//! events into a sink" (spec.md §9 Design Notes), mirroring
//! `oj-adapters::AgentAdapter`'s trait-object adapter registry.

use async_trait::async_trait;
use conclave_core::{SpawnId, TurnId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Everything a [`ChildAgentBinding`] needs to drive one child loop
/// (spec.md §4.4.2 step 6).
#[derive(Debug, Clone)]
pub struct ChildLoopConfig {
    pub spawn_id: SpawnId,
    pub parent_turn_id: TurnId,
    pub profile: String,
    pub plan_id: Option<String>,
    pub prompt: String,
    pub cwd: PathBuf,
    /// `ADAF_*` augmentation plus any caller-supplied overrides.
    pub extra_env: Vec<(String, String)>,
}

/// How a child loop finished, as observed by the binding itself (spec.md
/// §4.3 "On child-loop termination"). The orchestrator classifies this into
/// a [`crate::state_machine::ChildTermination`].
#[derive(Debug, Clone)]
pub struct ChildOutcome {
    pub exit_code: Option<i32>,
    pub canceled: bool,
    pub error: Option<String>,
}

/// A backing agent type: launches a prompt-driven child process and streams
/// its raw textual output into `raw_tx` until it exits or `cancel` fires.
///
/// Implementations must return promptly once `cancel` is signaled (spec.md
/// §5 "The child loop is expected to return promptly when its context is
/// canceled").
#[async_trait]
pub trait ChildAgentBinding: Send + Sync {
    async fn run(
        &self,
        config: &ChildLoopConfig,
        cancel: CancellationToken,
        raw_tx: mpsc::UnboundedSender<String>,
    ) -> ChildOutcome;
}

/// Assembles the natural-language prompt handed to a child agent (spec.md
/// §4.4.2 step 5). Kept as a narrow seam so prompt templating — explicitly
/// out of scope (spec.md §1) — stays an external collaborator.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, parent_turn_id: &TurnId, child_profile: &str, task_text: &str) -> String;
}

/// Prompt builder that passes the task text through unchanged, used when no
/// richer template collaborator is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimPromptBuilder;

impl PromptBuilder for VerbatimPromptBuilder {
    fn build(&self, _parent_turn_id: &TurnId, _child_profile: &str, task_text: &str) -> String {
        task_text.to_string()
    }
}

/// Capability-style registry mapping a profile's `agent_type` to its
/// binding (spec.md §9: "Agent bindings are looked up by name through a
/// capability-style registry").
#[derive(Default, Clone)]
pub struct BindingRegistry {
    bindings: HashMap<String, Arc<dyn ChildAgentBinding>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent_type: impl Into<String>, binding: Arc<dyn ChildAgentBinding>) {
        self.bindings.insert(agent_type.into(), binding);
    }

    pub fn get(&self, agent_type: &str) -> Option<Arc<dyn ChildAgentBinding>> {
        self.bindings.get(agent_type).cloned()
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
