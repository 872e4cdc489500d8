// SPDX-License-Identifier: MIT OR Apache-2.0
//! Defensive accessors over raw platform payloads.
//!
//! Platform APIs and agent replies routinely return `null`, scalars, or the
//! wrong shape where an object is expected. Normalizers read nested fields
//! through these helpers instead of chaining lookups that would bail on the
//! first malformed level.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Safely read `obj[key]` as a string.
///
/// Returns `default` when `obj` is not an object, the key is absent, or the
/// value is `null`. Scalar values (numbers, booleans) are coerced to their
/// string form; objects and arrays fall back to `default`.
pub fn safe_nested_get(obj: Option<&Value>, key: &str, default: &str) -> String {
    let Some(Value::Object(map)) = obj else {
        return default.to_string();
    };
    match map.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => default.to_string(),
    }
}

/// Safely read `obj[key]` as a raw [`Value`] reference.
///
/// Returns `None` when `obj` is not an object or the key is absent. `null`
/// values are returned as-is so callers can distinguish "absent" from
/// "explicitly null".
pub fn safe_nested_value<'a>(obj: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    match obj {
        Some(Value::Object(map)) => map.get(key),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp from a platform API response.
///
/// Accepts a trailing `Z`, offsets with a colon (`+00:00`), and offsets
/// without one (`+0000`, as Jira emits). Empty or unparseable input yields
/// `None` — timestamp fields degrade rather than fail normalization.
pub fn parse_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    if timestamp.is_empty() {
        return None;
    }
    let mut normalized = timestamp.to_string();
    if let Some(stripped) = normalized.strip_suffix('Z') {
        normalized = format!("{stripped}+00:00");
    } else if offset_without_colon(&normalized) {
        let split = normalized.len() - 2;
        normalized = format!("{}:{}", &normalized[..split], &normalized[split..]);
    }
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// True when the string ends in a `±hhmm` offset with no colon.
fn offset_without_colon(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 5 {
        return false;
    }
    let tail = &bytes[bytes.len() - 5..];
    (tail[0] == b'+' || tail[0] == b'-') && tail[1..].iter().all(u8::is_ascii_digit)
}

/// Build the degradation marker stored in ticket metadata for values that
/// have no faithful JSON representation.
pub fn non_serializable_marker(type_name: &str, repr: &str) -> Value {
    serde_json::json!({
        "__non_serializable__": true,
        "type": type_name,
        "repr": repr,
    })
}

/// Label hygiene shared by every provider: trim, drop whitespace-only
/// entries, and deduplicate by value while preserving first-seen order.
pub fn clean_labels<I, S>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::new();
    for label in labels {
        let trimmed = label.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_get_on_object() {
        let v = json!({"name": "In Progress"});
        assert_eq!(safe_nested_get(Some(&v), "name", ""), "In Progress");
    }

    #[test]
    fn nested_get_on_null_object() {
        assert_eq!(safe_nested_get(Some(&Value::Null), "name", "x"), "x");
        assert_eq!(safe_nested_get(None, "name", "x"), "x");
    }

    #[test]
    fn nested_get_on_scalar_object() {
        let v = json!("just a string");
        assert_eq!(safe_nested_get(Some(&v), "name", "d"), "d");
    }

    #[test]
    fn nested_get_coerces_scalars() {
        let v = json!({"id": 10014, "flag": true});
        assert_eq!(safe_nested_get(Some(&v), "id", ""), "10014");
        assert_eq!(safe_nested_get(Some(&v), "flag", ""), "true");
    }

    #[test]
    fn nested_get_null_value_yields_default() {
        let v = json!({"assignee": null});
        assert_eq!(safe_nested_get(Some(&v), "assignee", "nobody"), "nobody");
    }

    #[test]
    fn nested_get_compound_value_yields_default() {
        let v = json!({"nodes": [1, 2]});
        assert_eq!(safe_nested_get(Some(&v), "nodes", ""), "");
    }

    #[test]
    fn nested_value_distinguishes_null_from_absent() {
        let v = json!({"parent": null});
        assert!(matches!(
            safe_nested_value(Some(&v), "parent"),
            Some(Value::Null)
        ));
        assert!(safe_nested_value(Some(&v), "missing").is_none());
    }

    #[test]
    fn timestamp_z_suffix() {
        let dt = parse_timestamp("2024-01-15T10:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn timestamp_offset_without_colon() {
        let dt = parse_timestamp("2024-01-15T10:30:00.000+0000").unwrap();
        assert_eq!(dt.timestamp(), 1705314600);
        let dt = parse_timestamp("2024-01-15T10:30:00-0500").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T15:30:00+00:00");
    }

    #[test]
    fn timestamp_offset_with_colon() {
        assert!(parse_timestamp("2024-01-15T10:30:00+05:30").is_some());
    }

    #[test]
    fn timestamp_garbage_is_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-45T99:99:99Z").is_none());
    }

    #[test]
    fn labels_trimmed_deduplicated_ordered() {
        let labels = clean_labels(["  backend ", "auth", "backend", "   ", "", "auth "]);
        assert_eq!(labels, vec!["backend", "auth"]);
        assert!(clean_labels(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn marker_shape() {
        let m = non_serializable_marker("set", "{1, 2, 3}");
        assert_eq!(m["__non_serializable__"], json!(true));
        assert_eq!(m["type"], json!("set"));
        assert_eq!(m["repr"], json!("{1, 2, 3}"));
    }
}
