// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial(adaf_env)]
fn no_markers_means_not_agent_context() {
    for var in [ADAF_TURN_ID, ADAF_PROFILE, ADAF_PARENT_TURN, ADAF_PLAN_ID, ADAF_SESSION_ID, ADAF_AGENT] {
        std::env::remove_var(var);
    }
    assert!(!in_agent_context());
}

#[test]
#[serial(adaf_env)]
fn any_marker_means_agent_context() {
    for var in [ADAF_TURN_ID, ADAF_PROFILE, ADAF_PARENT_TURN, ADAF_PLAN_ID, ADAF_SESSION_ID, ADAF_AGENT] {
        std::env::remove_var(var);
    }
    std::env::set_var(ADAF_AGENT, "1");
    assert!(in_agent_context());
    std::env::remove_var(ADAF_AGENT);
}

#[test]
fn child_env_includes_plan_id_only_when_present() {
    let without = child_env("s1", "t1", "pt1", "reviewer", None);
    assert!(without.iter().all(|(k, _)| k != ADAF_PLAN_ID));

    let with = child_env("s1", "t1", "pt1", "reviewer", Some("plan-9"));
    assert!(with.iter().any(|(k, v)| k == ADAF_PLAN_ID && v == "plan-9"));
    assert!(with.iter().any(|(k, v)| k == ADAF_AGENT && v == "1"));
}
