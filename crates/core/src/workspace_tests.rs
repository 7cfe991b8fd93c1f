// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn workspace_status_display() {
    assert_eq!(WorkspaceStatus::Creating.to_string(), "creating");
    assert_eq!(WorkspaceStatus::Ready.to_string(), "ready");
    assert_eq!(WorkspaceStatus::Cleaning.to_string(), "cleaning");
}

#[test]
fn workspace_id_equality_against_str() {
    let id = WorkspaceId::new("ws-1");
    assert_eq!(id, "ws-1");
}
