// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables consumed by child agent processes (spec.md §6.3).

/// The spawn id a child process was started for.
pub const ADAF_TURN_ID: &str = "ADAF_TURN_ID";
/// The profile name the child process is running as.
pub const ADAF_PROFILE: &str = "ADAF_PROFILE";
/// The parent turn id that delegated this spawn.
pub const ADAF_PARENT_TURN: &str = "ADAF_PARENT_TURN";
/// The plan id carried through from the spawn request, if any.
pub const ADAF_PLAN_ID: &str = "ADAF_PLAN_ID";
/// The top-level session id.
pub const ADAF_SESSION_ID: &str = "ADAF_SESSION_ID";
/// Marker set to `"1"` on every agent-context child process.
pub const ADAF_AGENT: &str = "ADAF_AGENT";

/// Presence of any `ADAF_*` variable marks a process as an agent context
/// (spec.md §6.3: "session management commands refuse to run inside such a
/// process").
pub fn in_agent_context() -> bool {
    [
        ADAF_TURN_ID,
        ADAF_PROFILE,
        ADAF_PARENT_TURN,
        ADAF_PLAN_ID,
        ADAF_SESSION_ID,
        ADAF_AGENT,
    ]
    .iter()
    .any(|var| std::env::var_os(var).is_some())
}

/// Build the environment augmentation for a child agent process
/// (spec.md §4.4.2 step 6).
pub fn child_env(
    session_id: &str,
    turn_id: &str,
    parent_turn: &str,
    profile: &str,
    plan_id: Option<&str>,
) -> Vec<(String, String)> {
    let mut env = vec![
        (ADAF_SESSION_ID.to_string(), session_id.to_string()),
        (ADAF_TURN_ID.to_string(), turn_id.to_string()),
        (ADAF_PARENT_TURN.to_string(), parent_turn.to_string()),
        (ADAF_PROFILE.to_string(), profile.to_string()),
        (ADAF_AGENT.to_string(), "1".to_string()),
    ];
    if let Some(plan_id) = plan_id {
        env.push((ADAF_PLAN_ID.to_string(), plan_id.to_string()));
    }
    env
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
