// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

struct NoopBinding;

#[async_trait::async_trait]
impl ChildAgentBinding for NoopBinding {
    async fn run(
        &self,
        _config: &ChildLoopConfig,
        _cancel: CancellationToken,
        _raw_tx: mpsc::UnboundedSender<String>,
    ) -> ChildOutcome {
        ChildOutcome {
            exit_code: Some(0),
            canceled: false,
            error: None,
        }
    }
}

#[test]
fn registry_returns_none_for_unknown_agent_type() {
    let registry = BindingRegistry::new();
    assert!(registry.get("claude").is_none());
}

#[test]
fn registry_resolves_a_registered_agent_type() {
    let mut registry = BindingRegistry::new();
    registry.register("claude", Arc::new(NoopBinding));
    assert!(registry.get("claude").is_some());
    assert!(registry.get("codex").is_none());
}

#[test]
fn verbatim_prompt_builder_passes_task_text_through() {
    let builder = VerbatimPromptBuilder;
    let turn = TurnId::new("t1");
    assert_eq!(builder.build(&turn, "reviewer", "do the thing"), "do the thing");
}
