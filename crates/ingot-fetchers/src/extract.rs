// SPDX-License-Identifier: MIT OR Apache-2.0
//! JSON extraction from free-form agent replies.
//!
//! Backends are asked for exactly one JSON object but reply with whatever
//! their chat surface produces: fenced blocks, commentary, or both. The
//! extractor tries three strategies in priority order and returns the first
//! parse that succeeds *and* is an object:
//!
//! 1. every ` ```json `-tagged fenced block;
//! 2. every untagged (or otherwise-tagged) fenced block;
//! 3. the first balanced `{ ... }` substring that parses as an object.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

static JSON_CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*\n?(.*?)\n?```").unwrap());
// Permissive tag match so ```jsonc, ```text and friends are still tried.
static ANY_CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:[^\n]*)?\n?(.*?)\n?```").unwrap());

/// Attempt to parse `text` as a JSON object; non-objects are rejected.
fn try_parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(other) => {
            warn!(kind = %json_kind(&other), "parsed valid JSON but expected an object");
            None
        }
        Err(_) => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Scan for the first balanced-brace substring that parses as an object.
///
/// Candidate spans open at each `{` and close where the nesting depth
/// returns to zero; a candidate that fails to parse moves the search past
/// its opening brace.
fn first_balanced_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;
    loop {
        let start = text[search_from..].find('{')? + search_from;
        let mut depth = 0usize;
        for (offset, &b) in bytes[start..].iter().enumerate() {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        let candidate = &text[start..=start + offset];
                        if let Some(value) = try_parse_object(candidate) {
                            return Some(value);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
    }
}

/// Extract a JSON object from an agent reply.
///
/// Returns `None` when no strategy yields an object; the caller owns the
/// error shaping (truncated preview, fetcher name).
pub fn extract_json_object(response: &str) -> Option<Value> {
    if response.trim().is_empty() {
        return None;
    }

    for caps in JSON_CODE_BLOCK.captures_iter(response) {
        if let Some(value) = try_parse_object(caps[1].trim()) {
            debug!("extracted JSON from json-tagged code block");
            return Some(value);
        }
    }

    for caps in ANY_CODE_BLOCK.captures_iter(response) {
        if let Some(value) = try_parse_object(caps[1].trim()) {
            debug!("extracted JSON from untagged code block");
            return Some(value);
        }
    }

    if let Some(value) = first_balanced_object(response) {
        debug!("extracted JSON from raw text");
        return Some(value);
    }

    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_tagged_block_wins() {
        let reply = "Here you go:\n```json\n{\"key\": \"PROJ-1\"}\n```\nDone.";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"key": "PROJ-1"}));
    }

    #[test]
    fn json_tag_case_insensitive() {
        let reply = "```JSON\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn untagged_block_second_priority() {
        let reply = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn other_tagged_blocks_still_tried() {
        let reply = "```jsonc\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"a": 1}));
    }

    #[test]
    fn bad_tagged_block_falls_through_to_next() {
        let reply = "```json\nnot json\n```\nbut inline {\"b\": 2} works";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"b": 2}));
    }

    #[test]
    fn inline_object_from_raw_text() {
        let reply = "The ticket is {\"key\": \"X-1\", \"nested\": {\"n\": 1}} as requested.";
        assert_eq!(
            extract_json_object(reply).unwrap(),
            json!({"key": "X-1", "nested": {"n": 1}})
        );
    }

    #[test]
    fn skips_unparseable_braces_and_finds_later_object() {
        let reply = "{oops} then {\"fine\": true}";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"fine": true}));
    }

    #[test]
    fn arrays_are_not_objects() {
        assert!(extract_json_object("```json\n[1, 2, 3]\n```").is_none());
    }

    #[test]
    fn scalars_are_not_objects() {
        assert!(extract_json_object("```json\n42\n```").is_none());
    }

    #[test]
    fn garbage_yields_none() {
        assert!(extract_json_object("not valid json at all").is_none());
        assert!(extract_json_object("").is_none());
        assert!(extract_json_object("   \n  ").is_none());
    }

    #[test]
    fn first_of_multiple_tagged_blocks_wins() {
        let reply = "```json\n{\"first\": 1}\n```\n```json\n{\"second\": 2}\n```";
        assert_eq!(extract_json_object(reply).unwrap(), json!({"first": 1}));
    }

    #[test]
    fn unbalanced_braces_yield_none() {
        assert!(extract_json_object("{\"open\": ").is_none());
    }
}
