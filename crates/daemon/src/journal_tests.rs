// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::wire::RawPayload;
use tempfile::tempdir;

#[test]
fn append_writes_one_line_per_frame() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("events.jsonl");
    let journal = Journal::open(&path).unwrap();

    journal.append(
        FrameTag::Raw,
        Some(&Payload::Raw(RawPayload {
            turn_id: None,
            spawn_id: None,
            text: "line one".to_string(),
        })),
    );
    journal.append(FrameTag::Live, None);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("line one"));
}

#[test]
fn journal_assigns_strictly_increasing_sequence_numbers() {
    let dir = tempdir().unwrap();
    let journal = Journal::open(&dir.path().join("events.jsonl")).unwrap();

    journal.append(FrameTag::Live, None);
    journal.append(FrameTag::Live, None);
    journal.append(FrameTag::Live, None);

    let contents = std::fs::read_to_string(dir.path().join("events.jsonl")).unwrap();
    let seqs: Vec<u64> = contents
        .lines()
        .map(|l| {
            let v: serde_json::Value = serde_json::from_str(l).unwrap();
            v["seq"].as_u64().unwrap()
        })
        .collect();
    assert_eq!(seqs, vec![0, 1, 2]);
}

#[test]
fn open_creates_missing_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("c").join("events.jsonl");
    assert!(Journal::open(&path).is_ok());
    assert!(path.parent().unwrap().is_dir());
}
