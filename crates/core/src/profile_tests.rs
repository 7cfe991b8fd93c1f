// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn builder_sets_optional_fields() {
    let p = Profile::new("reviewer", "claude")
        .with_max_instances(3)
        .with_timeout(std::time::Duration::from_secs(60));
    assert_eq!(p.max_instances, Some(3));
    assert_eq!(p.timeout, Some(std::time::Duration::from_secs(60)));
}

#[test]
fn profile_set_lookup() {
    let mut set = ProfileSet::new();
    set.insert(Profile::new("scout", "claude"));
    assert!(set.contains("scout"));
    assert!(!set.contains("ghost"));
    assert_eq!(set.get("scout").unwrap().agent_type, "claude");
}

#[test]
fn profile_serde_round_trips_timeout() {
    let p = Profile::new("a", "b").with_timeout(std::time::Duration::from_millis(1500));
    let json = serde_json::to_string(&p).unwrap();
    let back: Profile = serde_json::from_str(&json).unwrap();
    assert_eq!(back.timeout, Some(std::time::Duration::from_millis(1500)));
}
