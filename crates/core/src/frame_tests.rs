// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn seq_allocator_is_strictly_increasing() {
    let alloc = SeqAllocator::new();
    let a = alloc.next();
    let b = alloc.next();
    let c = alloc.next();
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn peek_does_not_allocate() {
    let alloc = SeqAllocator::new();
    let peeked = alloc.peek();
    let allocated = alloc.next();
    assert_eq!(peeked, allocated);
    assert_eq!(alloc.peek(), allocated + 1);
}

#[test]
fn replay_relevant_tags() {
    assert!(FrameTag::Prompt.is_replay_relevant());
    assert!(FrameTag::Event.is_replay_relevant());
    assert!(FrameTag::Raw.is_replay_relevant());
    assert!(!FrameTag::Meta.is_replay_relevant());
    assert!(!FrameTag::Snapshot.is_replay_relevant());
}

#[test]
fn frame_without_payload_omits_data_field() {
    let frame: BroadcastFrame<()> = BroadcastFrame {
        seq: 1,
        tag: FrameTag::Live,
        data: None,
    };
    let json = serde_json::to_string(&frame).unwrap();
    assert!(!json.contains("\"data\""));
}

#[test]
fn tag_is_keyed_as_type_on_the_wire() {
    let frame: BroadcastFrame<()> = BroadcastFrame {
        seq: 1,
        tag: FrameTag::ControlResult,
        data: None,
    };
    let json = serde_json::to_string(&frame).unwrap();
    assert!(json.contains("\"type\":\"control_result\""), "{json}");
    assert!(!json.contains("\"tag\""), "{json}");
}
