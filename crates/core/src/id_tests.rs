// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

define_id! {
    /// Test-only id type.
    pub struct TestId;
}

#[test]
fn short_truncates_long_strings() {
    let id = TestId::new("abcdefghij");
    assert_eq!(id.short(4), "abcd");
}

#[test]
fn short_leaves_short_strings_untouched() {
    let id = TestId::new("ab");
    assert_eq!(id.short(4), "ab");
}

#[test]
fn sequential_id_gen_is_monotonic_and_unique() {
    let gen = SequentialIdGen::new("t");
    let a = gen.next();
    let b = gen.next();
    assert_ne!(a, b);
    assert_eq!(a, "t-1");
    assert_eq!(b, "t-2");
}

#[test]
fn spawn_id_gen_starts_at_one_and_increments() {
    let gen = SpawnIdGen::new();
    assert_eq!(gen.next().0, 1);
    assert_eq!(gen.next().0, 2);
    assert_eq!(gen.next().0, 3);
}

#[test]
fn spawn_id_gen_shared_across_clones() {
    let gen = SpawnIdGen::new();
    let cloned = gen.clone();
    assert_eq!(gen.next().0, 1);
    assert_eq!(cloned.next().0, 2);
}
