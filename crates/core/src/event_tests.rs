// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn event_name_matches_tag() {
    let ev = Event::Done { error: None };
    assert_eq!(ev.name(), "done");
}

#[test]
fn log_summary_never_includes_raw_text() {
    let ev = Event::AgentRaw {
        turn_id: None,
        spawn_id: Some(SpawnId(3)),
        text: "a very long chunk of agent stdout".to_string(),
    };
    let summary = ev.log_summary();
    assert!(!summary.contains("very long"));
    assert!(summary.contains("bytes="));
}

#[test]
fn spawn_status_changed_serializes() {
    let ev = Event::SpawnStatusChanged {
        spawns: vec![SpawnSnapshot {
            id: SpawnId(1),
            child_profile: "reviewer".to_string(),
            role: None,
            status: SpawnStatus::Running,
        }],
    };
    let json = serde_json::to_string(&ev).unwrap();
    assert!(json.contains("reviewer"));
}
