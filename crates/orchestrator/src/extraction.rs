// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Final-message extraction (spec.md §4.4.4): pull the child's last
//! natural-language assistant message out of its raw textual output.
//! Line-by-line `serde_json::Value` scanning mirrors the teacher's
//! line-oriented JSONL agent-stream parsing (`oj-adapters::agent::claude`'s
//! `watcher.rs`/`log_entry.rs`).

use serde_json::Value;

/// Scan `raw_output` for the last assistant message across the three
/// recognized JSON shapes (spec.md §4.4.4). Returns `None` if the trimmed
/// input is empty, or if every line is JSON but none of it matches a known
/// shape. If no line parses as JSON at all, the entire trimmed input is
/// returned verbatim (the fallback).
pub fn extract_final_message(raw_output: &str) -> Option<String> {
    let trimmed = raw_output.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut last_match: Option<String> = None;
    let mut saw_any_json = false;

    for line in trimmed.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(value) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        saw_any_json = true;
        if let Some(text) = extract_from_value(&value) {
            last_match = Some(text);
        }
    }

    if let Some(text) = last_match {
        return Some(text);
    }

    if saw_any_json {
        // Every JSON line was parseable but none matched a known
        // assistant-message shape.
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn extract_from_value(value: &Value) -> Option<String> {
    if let Some(text) = extract_role_assistant(value) {
        return Some(text);
    }
    if let Some(text) = extract_type_assistant(value) {
        return Some(text);
    }
    extract_item_completed(value)
}

/// `{"role":"assistant","content":<string|array-of-blocks>}`
fn extract_role_assistant(value: &Value) -> Option<String> {
    if value.get("role")?.as_str()? != "assistant" {
        return None;
    }
    extract_content(value.get("content")?)
}

/// `{"type":"assistant","message":{"content":[...blocks...]}}`
fn extract_type_assistant(value: &Value) -> Option<String> {
    if value.get("type")?.as_str()? != "assistant" {
        return None;
    }
    extract_content(value.get("message")?.get("content")?)
}

/// `{"type":"item.completed","item":{"type":"agent_message","text":"..."}}`
fn extract_item_completed(value: &Value) -> Option<String> {
    if value.get("type")?.as_str()? != "item.completed" {
        return None;
    }
    let item = value.get("item")?;
    if item.get("type")?.as_str()? != "agent_message" {
        return None;
    }
    item.get("text")?.as_str().map(|s| s.to_string())
}

/// `content` may be a plain string or an array of `{"type":"text","text":...}`
/// blocks; non-text blocks are skipped and text blocks are concatenated.
fn extract_content(content: &Value) -> Option<String> {
    if let Some(s) = content.as_str() {
        return Some(s.to_string());
    }
    let blocks = content.as_array()?;
    let mut out = String::new();
    for block in blocks {
        if block.get("type").and_then(Value::as_str) == Some("text") {
            if let Some(text) = block.get("text").and_then(Value::as_str) {
                out.push_str(text);
            }
        }
    }
    Some(out)
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
