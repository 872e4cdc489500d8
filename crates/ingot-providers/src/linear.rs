// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear provider: input parsing and GraphQL payload normalization.

use std::sync::{Arc, LazyLock};

use ingot_core::{
    GenericTicket, Platform, TicketStatus, TicketType, clean_labels, parse_timestamp,
    safe_nested_get, sanitize_title_for_branch,
};
use ingot_error::{Result, TicketError};
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::provider::{ProviderDeps, TicketProvider};
use crate::registry::ProviderFactory;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://linear\.app/(?P<org>[^/]+)/issue/(?P<ticket_id>[A-Z][A-Z0-9]*-\d+)(?:/[^/]*)?$",
    )
    .unwrap()
});
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<ticket_id>[A-Z][A-Z0-9]*-\d+)$").unwrap());

const PROMPT_TEMPLATE: &str = r#"Use your Linear tool to fetch issue {ticket_id}.

Return ONLY a valid JSON object with these fields (no markdown, no explanation).
Fields can be null if not available.

{
  "identifier": "TEAM-123",
  "title": "issue title",
  "description": "full description text",
  "state": {"name": "Todo"},
  "assignee": null,
  "labels": {"nodes": [{"name": "label1"}]},
  "createdAt": "2024-01-15T10:30:00Z",
  "updatedAt": "2024-01-16T14:20:00Z",
  "priority": 2,
  "team": {"key": "TEAM"},
  "url": "https://linear.app/team/issue/TEAM-123"
}"#;

/// Specific state names that override `state.type`.
///
/// "In Review" carries `type: "started"` on most Linear workflows but must
/// map to review, so names are consulted before types.
fn map_state_name(state_name: &str) -> Option<TicketStatus> {
    match state_name.to_lowercase().as_str() {
        "in review" | "review" | "code review" | "pending review" => Some(TicketStatus::Review),
        "backlog" | "triage" => Some(TicketStatus::Open),
        "todo" | "to do" | "ready" => Some(TicketStatus::Open),
        "in progress" | "in development" => Some(TicketStatus::InProgress),
        "done" | "complete" | "completed" => Some(TicketStatus::Done),
        "canceled" | "cancelled" => Some(TicketStatus::Closed),
        _ => None,
    }
}

/// Linear's five workflow state types.
fn map_state_type(state_type: &str) -> Option<TicketStatus> {
    match state_type.to_lowercase().as_str() {
        "backlog" | "unstarted" => Some(TicketStatus::Open),
        "started" => Some(TicketStatus::InProgress),
        "completed" => Some(TicketStatus::Done),
        "canceled" => Some(TicketStatus::Closed),
        _ => None,
    }
}

const TYPE_KEYWORDS: &[(TicketType, &[&str])] = &[
    (
        TicketType::Bug,
        &["bug", "defect", "fix", "error", "crash", "regression", "issue"],
    ),
    (
        TicketType::Feature,
        &["feature", "enhancement", "story", "improvement", "new"],
    ),
    (TicketType::Task, &["task", "chore", "todo", "spike", "research"]),
    (
        TicketType::Maintenance,
        &["maintenance", "tech-debt", "tech debt", "refactor", "cleanup", "infrastructure", "devops"],
    ),
];

fn map_type(labels: &[String]) -> TicketType {
    for label in labels {
        let label = label.to_lowercase();
        for (ticket_type, keywords) in TYPE_KEYWORDS {
            if keywords.iter().any(|kw| label.contains(kw)) {
                return *ticket_type;
            }
        }
    }
    // Linear defaults to feature work when labels carry no type hint.
    TicketType::Feature
}

/// Linear issue provider.
pub struct LinearProvider;

impl LinearProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(_deps: &ProviderDeps) -> Self {
        Self
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::Linear,
            id: "linear",
            build: |deps| Arc::new(LinearProvider::new(deps)),
        }
    }

    fn extract_labels(labels_obj: Option<&Value>) -> Vec<String> {
        let Some(Value::Object(map)) = labels_obj else {
            return Vec::new();
        };
        let Some(Value::Array(nodes)) = map.get("nodes") else {
            return Vec::new();
        };
        clean_labels(
            nodes
                .iter()
                .map(|node| safe_nested_get(Some(node), "name", "")),
        )
    }
}

impl TicketProvider for LinearProvider {
    fn platform(&self) -> Platform {
        Platform::Linear
    }

    fn name(&self) -> &'static str {
        "Linear"
    }

    fn can_handle(&self, input: &str) -> bool {
        let input = input.trim();
        URL_PATTERN.is_match(input) || ID_PATTERN.is_match(input)
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if let Some(caps) = URL_PATTERN.captures(input) {
            return Ok(caps["ticket_id"].to_uppercase());
        }
        if let Some(caps) = ID_PATTERN.captures(input) {
            return Ok(caps["ticket_id"].to_uppercase());
        }
        Err(TicketError::TicketIdFormat {
            platform: "Linear".into(),
            ticket_id: input.into(),
            expected: "TEAM-123 or a linear.app issue URL".into(),
        })
    }

    fn normalize(&self, raw: &Value, _ticket_id: Option<&str>) -> Result<GenericTicket> {
        let ticket_id = raw
            .get("identifier")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        if ticket_id.is_empty() {
            return Err(TicketError::Validation(
                "cannot normalize Linear ticket: 'identifier' field is missing or empty".into(),
            ));
        }

        let state = raw.get("state");
        let state_name = safe_nested_get(state, "name", "");
        let state_type = safe_nested_get(state, "type", "");
        let status = map_state_name(&state_name)
            .or_else(|| map_state_type(&state_type))
            .unwrap_or(TicketStatus::Unknown);

        let assignee_obj = raw.get("assignee");
        let assignee_name = safe_nested_get(assignee_obj, "name", "");
        let assignee = if !assignee_name.is_empty() {
            Some(assignee_name)
        } else {
            let email = safe_nested_get(assignee_obj, "email", "");
            (!email.is_empty()).then_some(email)
        };

        let labels = Self::extract_labels(raw.get("labels"));
        let title = raw.get("title").and_then(Value::as_str).unwrap_or("");
        let cycle = safe_nested_get(raw.get("cycle"), "name", "");
        let parent_id = safe_nested_get(raw.get("parent"), "identifier", "");

        // raw_response is intentionally omitted from metadata to keep the
        // cache and logs lean.
        let mut metadata = Map::new();
        metadata.insert(
            "linear_uuid".into(),
            json!(raw.get("id").and_then(Value::as_str).unwrap_or("")),
        );
        metadata.insert("team_key".into(), json!(safe_nested_get(raw.get("team"), "key", "")));
        metadata.insert("team_name".into(), json!(safe_nested_get(raw.get("team"), "name", "")));
        metadata.insert(
            "priority_label".into(),
            json!(raw.get("priorityLabel").and_then(Value::as_str).unwrap_or("")),
        );
        metadata.insert(
            "priority_value".into(),
            raw.get("priority").cloned().unwrap_or(Value::Null),
        );
        metadata.insert("state_name".into(), json!(state_name));
        metadata.insert("state_type".into(), json!(state_type));
        metadata.insert(
            "cycle".into(),
            if cycle.is_empty() { Value::Null } else { json!(cycle) },
        );
        metadata.insert(
            "parent_id".into(),
            if parent_id.is_empty() { Value::Null } else { json!(parent_id) },
        );

        Ok(GenericTicket {
            id: ticket_id.to_string(),
            platform: Platform::Linear,
            url: raw.get("url").and_then(Value::as_str).unwrap_or("").to_string(),
            title: title.to_string(),
            description: raw
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            status,
            ticket_type: map_type(&labels),
            assignee,
            labels,
            created_at: raw
                .get("createdAt")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            updated_at: raw
                .get("updatedAt")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            branch_summary: sanitize_title_for_branch(title, 50),
            full_info: String::new(),
            platform_metadata: metadata,
        })
    }

    fn prompt_template(&self) -> &'static str {
        PROMPT_TEMPLATE
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
