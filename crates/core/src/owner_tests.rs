// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn turn_id_round_trips_through_display() {
    let id = TurnId::new("turn-7");
    assert_eq!(id.to_string(), "turn-7");
    assert_eq!(id, "turn-7");
}

#[test]
fn turn_id_default_is_empty() {
    let id = TurnId::default();
    assert_eq!(id.as_str(), "");
}
