// SPDX-License-Identifier: MIT OR Apache-2.0
//! Monday.com provider: board/pulse URL parsing and item normalization.

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
        r"(?i)^https?://(?:(?P<slug>[^.]+)\.)?monday\.com/boards/(?P<board>\d+)(?:/views/\d+)?/pulses/(?P<item>\d+)",
    )
    .unwrap()
});

const STATUS_KEYWORDS: &[(TicketStatus, &[&str])] = &[
    (TicketStatus::InProgress, &["working on it", "in progress", "active", "started"]),
    (TicketStatus::Review, &["review", "waiting for review", "pending", "awaiting"]),
    (TicketStatus::Blocked, &["stuck", "blocked", "on hold", "waiting"]),
    (TicketStatus::Done, &["done", "complete", "completed", "closed", "finished"]),
    (TicketStatus::Open, &["not started", "new", "to do", "backlog"]),
];

const TYPE_KEYWORDS: &[(TicketType, &[&str])] = &[
    (TicketType::Bug, &["bug", "defect", "issue", "fix", "error", "crash"]),
    (TicketType::Feature, &["feature", "enhancement", "story", "user story", "new"]),
    (TicketType::Task, &["task", "chore", "todo", "action item"]),
    (TicketType::Maintenance, &["maintenance", "tech debt", "refactor", "cleanup", "infra"]),
];

fn map_status(label: &str) -> TicketStatus {
    let label = label.to_lowercase();
    let label = label.trim();
    if label.is_empty() {
        return TicketStatus::Open;
    }
    for (status, keywords) in STATUS_KEYWORDS {
        if keywords.iter().any(|kw| label.contains(kw)) {
            return *status;
        }
    }
    TicketStatus::Unknown
}

fn map_type(labels: &[String]) -> TicketType {
    for label in labels {
        let label = label.to_lowercase();
        for (ticket_type, keywords) in TYPE_KEYWORDS {
            if keywords.iter().any(|kw| label.contains(kw)) {
                return *ticket_type;
            }
        }
    }
    TicketType::Unknown
}

/// Monday.com item provider.
///
/// The provider is a singleton, so no request state lives on it: the
/// account slug travels inside the composite id produced by `parse_input`
/// (`slug:board:item`) and ends up only in metadata — the normalized ticket
/// id is `board:item`.
pub struct MondayProvider;

impl MondayProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(_deps: &ProviderDeps) -> Self {
        Self
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::Monday,
            id: "monday",
            build: |deps| Arc::new(MondayProvider::new(deps)),
        }
    }

    fn find_column_text(columns: &[Value], col_type: &str) -> String {
        for col in columns {
            if safe_nested_get(Some(col), "type", "") == col_type {
                return safe_nested_get(Some(col), "text", "");
            }
        }
        String::new()
    }

    /// Description: a text column whose title mentions "desc", else the
    /// oldest update body.
    fn extract_description(item: &Value, columns: &[Value]) -> String {
        for col in columns {
            let col_type = safe_nested_get(Some(col), "type", "");
            let col_title = safe_nested_get(Some(col), "title", "").to_lowercase();
            if (col_type == "text" || col_type == "long_text") && col_title.contains("desc") {
                let text = safe_nested_get(Some(col), "text", "").trim().to_string();
                if !text.is_empty() {
                    return text;
                }
            }
        }
        if let Some(Value::Array(updates)) = item.get("updates")
            && let Some(oldest) = updates.last()
        {
            let body = safe_nested_get(Some(oldest), "text_body", "");
            if !body.is_empty() {
                return body;
            }
            return safe_nested_get(Some(oldest), "body", "");
        }
        String::new()
    }
}

impl TicketProvider for MondayProvider {
    fn platform(&self) -> Platform {
        Platform::Monday
    }

    fn name(&self) -> &'static str {
        "Monday.com"
    }

    fn can_handle(&self, input: &str) -> bool {
        URL_PATTERN.is_match(input.trim())
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if let Some(caps) = URL_PATTERN.captures(input) {
            let slug = caps.name("slug").map(|m| m.as_str()).unwrap_or("");
            return Ok(format!("{slug}:{}:{}", &caps["board"], &caps["item"]));
        }
        Err(TicketError::TicketIdFormat {
            platform: "Monday.com".into(),
            ticket_id: input.into(),
            expected: "a monday.com board/pulse URL".into(),
        })
    }

    fn normalize(&self, raw: &Value, ticket_id: Option<&str>) -> Result<GenericTicket> {
        let item_id = safe_nested_get(Some(raw), "id", "");
        if item_id.is_empty() {
            return Err(TicketError::Validation(
                "cannot normalize Monday.com item: 'id' field missing".into(),
            ));
        }

        let board = raw.get("board");
        let board_id = safe_nested_get(board, "id", "");
        let board_name = safe_nested_get(board, "name", "");

        // Account slug from the composite parse_input id, when present.
        let account_slug = ticket_id
            .map(|id| id.split(':').collect::<Vec<_>>())
            .filter(|parts| parts.len() >= 3 && !parts[0].is_empty())
            .map(|parts| parts[0].to_string());

        let normalized_id = if board_id.is_empty() {
            item_id.clone()
        } else {
            format!("{board_id}:{item_id}")
        };

        let empty = Vec::new();
        let columns = raw
            .get("column_values")
            .and_then(Value::as_array)
            .unwrap_or(&empty);
        let status_label = Self::find_column_text(columns, "status");
        let assignee_text = Self::find_column_text(columns, "people");
        let tags_text = Self::find_column_text(columns, "tag");
        let labels = clean_labels(tags_text.split(','));

        let url = match &account_slug {
            Some(slug) => format!("https://{slug}.monday.com/boards/{board_id}/pulses/{item_id}"),
            None => format!("https://monday.com/boards/{board_id}/pulses/{item_id}"),
        };

        let title = safe_nested_get(Some(raw), "name", "");

        let mut metadata = Map::new();
        metadata.insert("board_id".into(), json!(board_id));
        metadata.insert("board_name".into(), json!(board_name));
        metadata.insert(
            "group_title".into(),
            json!(safe_nested_get(raw.get("group"), "title", "")),
        );
        metadata.insert(
            "creator_name".into(),
            json!(safe_nested_get(raw.get("creator"), "name", "")),
        );
        metadata.insert("status_label".into(), json!(status_label));
        metadata.insert(
            "account_slug".into(),
            account_slug.map(Value::String).unwrap_or(Value::Null),
        );

        Ok(GenericTicket {
            id: normalized_id,
            platform: Platform::Monday,
            url,
            title: title.clone(),
            description: Self::extract_description(raw, columns),
            status: map_status(&status_label),
            ticket_type: map_type(&labels),
            assignee: (!assignee_text.is_empty()).then_some(assignee_text),
            labels,
            created_at: parse_timestamp(&safe_nested_get(Some(raw), "created_at", "")),
            updated_at: parse_timestamp(&safe_nested_get(Some(raw), "updated_at", "")),
            branch_summary: sanitize_title_for_branch(&title, 50),
            full_info: String::new(),
            platform_metadata: metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> MondayProvider {
        MondayProvider::new(&ProviderDeps::default())
    }

    #[test]
    fn handles_url_variants() {
        let p = provider();
        assert!(p.can_handle("https://acme.monday.com/boards/123/pulses/456"));
        assert!(p.can_handle("https://monday.com/boards/123/pulses/456"));
        assert!(p.can_handle("https://view.monday.com/boards/123/views/9/pulses/456"));
        assert!(!p.can_handle("https://monday.com/boards/123"));
        assert!(!p.can_handle("456"));
    }

    #[test]
    fn parse_builds_composite_id() {
        let p = provider();
        assert_eq!(
            p.parse_input("https://acme.monday.com/boards/123/pulses/456").unwrap(),
            "acme:123:456"
        );
        // Slug empty for bare monday.com.
        assert_eq!(
            p.parse_input("https://monday.com/boards/123/pulses/456").unwrap(),
            ":123:456"
        );
    }

    fn item() -> Value {
        json!({
            "id": "456",
            "name": "Ship the widget",
            "created_at": "2024-01-15T10:30:00Z",
            "updated_at": "2024-01-16T14:20:00Z",
            "board": {"id": "123", "name": "Roadmap"},
            "group": {"id": "g1", "title": "This week"},
            "creator": {"name": "Ana"},
            "column_values": [
                {"id": "status", "type": "status", "title": "Status", "text": "Working on it"},
                {"id": "people", "type": "people", "title": "Owner", "text": "Ana Lopez"},
                {"id": "tags", "type": "tag", "title": "Tags", "text": "feature, ui"},
                {"id": "desc", "type": "long_text", "title": "Description", "text": "Build it well"}
            ]
        })
    }

    #[test]
    fn normalizes_item_with_slug_context() {
        let t = provider().normalize(&item(), Some("acme:123:456")).unwrap();
        // Slug lives in metadata only; the ticket id is board:item.
        assert_eq!(t.id, "123:456");
        assert_eq!(t.platform_metadata["account_slug"], json!("acme"));
        assert_eq!(t.url, "https://acme.monday.com/boards/123/pulses/456");
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.ticket_type, TicketType::Feature);
        assert_eq!(t.assignee.as_deref(), Some("Ana Lopez"));
        assert_eq!(t.labels, vec!["feature", "ui"]);
        assert_eq!(t.description, "Build it well");
    }

    #[test]
    fn normalizes_without_slug() {
        let t = provider().normalize(&item(), Some(":123:456")).unwrap();
        assert_eq!(t.platform_metadata["account_slug"], Value::Null);
        assert_eq!(t.url, "https://monday.com/boards/123/pulses/456");
    }

    #[test]
    fn description_falls_back_to_oldest_update() {
        let raw = json!({
            "id": "9",
            "name": "x",
            "board": {"id": "1"},
            "column_values": [],
            "updates": [
                {"text_body": "newest"},
                {"text_body": "oldest"}
            ]
        });
        let t = provider().normalize(&raw, None).unwrap();
        assert_eq!(t.description, "oldest");
    }

    #[test]
    fn empty_status_label_is_open() {
        assert_eq!(map_status(""), TicketStatus::Open);
        assert_eq!(map_status("Stuck"), TicketStatus::Blocked);
        assert_eq!(map_status("Done!"), TicketStatus::Done);
        assert_eq!(map_status("???"), TicketStatus::Unknown);
    }

    #[test]
    fn missing_id_is_fatal() {
        assert!(provider().normalize(&json!({"name": "x"}), None).is_err());
    }

    #[test]
    fn no_prompt_template() {
        assert_eq!(provider().prompt_template(), "");
    }
}
