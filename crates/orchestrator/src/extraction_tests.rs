// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn later_assistant_message_overwrites_earlier_ones() {
    let input = "{\"role\":\"assistant\",\"content\":\"draft\"}\n\
                 {\"role\":\"assistant\",\"content\":\"\"}\n\
                 {\"role\":\"assistant\",\"content\":\"final report\"}";
    assert_eq!(extract_final_message(input).as_deref(), Some("final report"));
}

#[test]
fn non_json_payload_falls_back_to_trimmed_verbatim_text() {
    let input = "  just some plain output\nwith two lines  ";
    assert_eq!(
        extract_final_message(input).as_deref(),
        Some("just some plain output\nwith two lines")
    );
}

#[test]
fn only_non_assistant_json_entries_fails() {
    let input = "{\"role\":\"system\",\"content\":\"setup\"}\n{\"type\":\"tool_use\",\"name\":\"ls\"}";
    assert_eq!(extract_final_message(input), None);
}

#[test]
fn empty_input_fails() {
    assert_eq!(extract_final_message("   \n  "), None);
}

#[test]
fn content_array_of_text_blocks_concatenates() {
    let input = r#"{"role":"assistant","content":[{"type":"text","text":"hello "},{"type":"tool_use","name":"x"},{"type":"text","text":"world"}]}"#;
    assert_eq!(extract_final_message(input).as_deref(), Some("hello world"));
}

#[test]
fn type_assistant_message_shape() {
    let input = r#"{"type":"assistant","message":{"content":[{"type":"text","text":"from message shape"}]}}"#;
    assert_eq!(extract_final_message(input).as_deref(), Some("from message shape"));
}

#[test]
fn item_completed_agent_message_shape() {
    let input = r#"{"type":"item.completed","item":{"type":"agent_message","text":"agent message text"}}"#;
    assert_eq!(extract_final_message(input).as_deref(), Some("agent message text"));
}

#[test]
fn mixed_plain_lines_among_json_still_scanned_as_json_stream() {
    // A line that fails to parse as JSON is skipped, not treated as a
    // fallback trigger, as long as at least one other line parses.
    let input = "not json\n{\"role\":\"assistant\",\"content\":\"final\"}";
    assert_eq!(extract_final_message(input).as_deref(), Some("final"));
}
