// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn resolve_single_match_needs_no_role() {
    let rule = DelegationRule::new(vec![DelegationEntry::new("reviewer")]);
    let entry = rule.resolve("reviewer", None).unwrap();
    assert_eq!(entry.child_profile, "reviewer");
}

#[test]
fn resolve_unknown_profile_is_not_delegated() {
    let rule = DelegationRule::new(vec![DelegationEntry::new("reviewer")]);
    assert_eq!(rule.resolve("ghost", None), Err(ResolveError::NotDelegated));
}

#[test]
fn resolve_ambiguous_without_role_fails() {
    let rule = DelegationRule::new(vec![
        DelegationEntry::new("reviewer").with_role("strict"),
        DelegationEntry::new("reviewer").with_role("lenient"),
    ]);
    assert_eq!(
        rule.resolve("reviewer", None),
        Err(ResolveError::MultipleRoles)
    );
}

#[test]
fn resolve_ambiguous_with_role_succeeds() {
    let rule = DelegationRule::new(vec![
        DelegationEntry::new("reviewer").with_role("strict"),
        DelegationEntry::new("reviewer").with_role("lenient"),
    ]);
    let entry = rule.resolve("reviewer", Some("lenient")).unwrap();
    assert_eq!(entry.role.as_deref(), Some("lenient"));
}

#[test]
fn resolve_ambiguous_with_unknown_role_fails() {
    let rule = DelegationRule::new(vec![
        DelegationEntry::new("reviewer").with_role("strict"),
        DelegationEntry::new("reviewer").with_role("lenient"),
    ]);
    assert_eq!(
        rule.resolve("reviewer", Some("harsh")),
        Err(ResolveError::MultipleRoles)
    );
}

#[test]
fn effective_max_parallel_defaults_to_four() {
    let rule = DelegationRule::new(vec![]);
    assert_eq!(rule.effective_max_parallel(), DEFAULT_MAX_PARALLEL);
    assert_eq!(rule.effective_max_parallel(), 4);
}

#[test]
fn effective_max_parallel_honors_override() {
    let rule = DelegationRule::new(vec![]).with_max_parallel(10);
    assert_eq!(rule.effective_max_parallel(), 10);
}

#[test]
fn entry_timeout_multiplies_unit() {
    let entry = DelegationEntry::new("x").with_timeout_minutes(2);
    let timeout = entry
        .timeout(std::time::Duration::from_secs(60))
        .unwrap();
    assert_eq!(timeout, std::time::Duration::from_secs(120));
}
