// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn probe_socket_false_for_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!probe_socket(&dir.path().join("nonexistent")));
}

#[test]
fn probe_socket_true_for_bound_listener() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("sock");
    let _listener = std::os::unix::net::UnixListener::bind(&socket_path).unwrap();
    assert!(probe_socket(&socket_path));
}

#[test]
fn find_daemon_binary_honors_override() {
    std::env::set_var("CONCLAVE_DAEMON_BINARY", "/usr/local/bin/conclaved");
    assert_eq!(find_daemon_binary(), PathBuf::from("/usr/local/bin/conclaved"));
    std::env::remove_var("CONCLAVE_DAEMON_BINARY");
}
