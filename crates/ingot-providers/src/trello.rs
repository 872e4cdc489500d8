// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trello provider: card URL/short-link parsing and normalization.

use std::sync::{Arc, LazyLock};

use chrono::DateTime;
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
    Regex::new(r"(?i)^https?://trello\.com/c/(?P<short_link>[A-Z0-9]+)").unwrap()
});
static SHORT_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{8}$").unwrap());

const LIST_STATUS_KEYWORDS: &[(TicketStatus, &[&str])] = &[
    (TicketStatus::InProgress, &["in progress", "doing", "active", "working"]),
    (TicketStatus::Review, &["review", "in review", "testing", "qa"]),
    (TicketStatus::Blocked, &["blocked", "on hold", "waiting"]),
    (TicketStatus::Done, &["done", "complete", "completed", "closed", "archived"]),
    (TicketStatus::Open, &["to do", "backlog", "todo", "new", "inbox"]),
];

const TYPE_KEYWORDS: &[(TicketType, &[&str])] = &[
    (TicketType::Bug, &["bug", "defect", "fix", "error", "issue"]),
    (TicketType::Feature, &["feature", "enhancement", "story", "new"]),
    (TicketType::Task, &["task", "chore", "todo", "action"]),
    (TicketType::Maintenance, &["maintenance", "tech debt", "refactor", "cleanup", "infra"]),
];

fn map_list_to_status(list_name: &str) -> TicketStatus {
    let name = list_name.to_lowercase();
    let name = name.trim();
    for (status, keywords) in LIST_STATUS_KEYWORDS {
        if keywords.iter().any(|kw| name.contains(kw)) {
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

/// Trello card provider.
///
/// Status derives from the containing list's name; an archived (closed)
/// card overrides that to closed. Direct-API is the only fetch path.
pub struct TrelloProvider;

impl TrelloProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(_deps: &ProviderDeps) -> Self {
        Self
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::Trello,
            id: "trello",
            build: |deps| Arc::new(TrelloProvider::new(deps)),
        }
    }

    /// Card ids are Mongo ObjectIds; the leading 8 hex chars are the
    /// creation time in epoch seconds.
    fn created_at_from_card_id(card_id: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        let prefix = card_id.get(..8)?;
        let seconds = i64::from_str_radix(prefix, 16).ok()?;
        DateTime::from_timestamp(seconds, 0)
    }
}

impl TicketProvider for TrelloProvider {
    fn platform(&self) -> Platform {
        Platform::Trello
    }

    fn name(&self) -> &'static str {
        "Trello"
    }

    fn can_handle(&self, input: &str) -> bool {
        let input = input.trim();
        URL_PATTERN.is_match(input) || SHORT_LINK_PATTERN.is_match(input)
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if let Some(caps) = URL_PATTERN.captures(input) {
            return Ok(caps["short_link"].to_string());
        }
        if SHORT_LINK_PATTERN.is_match(input) {
            return Ok(input.to_string());
        }
        Err(TicketError::TicketIdFormat {
            platform: "Trello".into(),
            ticket_id: input.into(),
            expected: "an 8-character short link or a trello.com card URL".into(),
        })
    }

    fn normalize(&self, raw: &Value, _ticket_id: Option<&str>) -> Result<GenericTicket> {
        let short_link = safe_nested_get(Some(raw), "shortLink", "");
        let card_id = safe_nested_get(Some(raw), "id", "");
        let ticket_id = if short_link.is_empty() {
            card_id.clone()
        } else {
            short_link.clone()
        };
        if ticket_id.is_empty() {
            return Err(TicketError::Validation(
                "cannot normalize Trello card: 'id' and 'shortLink' missing".into(),
            ));
        }

        let list_name = safe_nested_get(raw.get("list"), "name", "");
        let mut status = map_list_to_status(&list_name);
        if raw.get("closed").and_then(Value::as_bool).unwrap_or(false) {
            status = TicketStatus::Closed;
        }

        let assignee = raw
            .get("members")
            .and_then(Value::as_array)
            .and_then(|members| members.first())
            .map(|first| safe_nested_get(Some(first), "fullName", ""))
            .filter(|name| !name.is_empty());

        let labels = raw
            .get("labels")
            .and_then(Value::as_array)
            .map(|arr| {
                clean_labels(
                    arr.iter()
                        .filter(|l| l.is_object())
                        .map(|l| safe_nested_get(Some(l), "name", "")),
                )
            })
            .unwrap_or_default();

        let title = safe_nested_get(Some(raw), "name", "");
        let url = {
            let full = safe_nested_get(Some(raw), "url", "");
            if full.is_empty() {
                safe_nested_get(Some(raw), "shortUrl", "")
            } else {
                full
            }
        };

        let mut metadata = Map::new();
        metadata.insert("board_id".into(), json!(safe_nested_get(Some(raw), "idBoard", "")));
        metadata.insert(
            "board_name".into(),
            json!(safe_nested_get(raw.get("board"), "name", "")),
        );
        metadata.insert("list_id".into(), json!(safe_nested_get(Some(raw), "idList", "")));
        metadata.insert("list_name".into(), json!(list_name));
        metadata.insert("due_date".into(), raw.get("due").cloned().unwrap_or(Value::Null));
        metadata.insert(
            "due_complete".into(),
            json!(raw.get("dueComplete").and_then(Value::as_bool).unwrap_or(false)),
        );
        metadata.insert(
            "is_closed".into(),
            json!(raw.get("closed").and_then(Value::as_bool).unwrap_or(false)),
        );
        metadata.insert("short_link".into(), json!(short_link));

        Ok(GenericTicket {
            id: ticket_id,
            platform: Platform::Trello,
            url,
            title: title.clone(),
            description: safe_nested_get(Some(raw), "desc", ""),
            status,
            ticket_type: map_type(&labels),
            assignee,
            labels,
            created_at: Self::created_at_from_card_id(&card_id),
            updated_at: parse_timestamp(&safe_nested_get(Some(raw), "dateLastActivity", "")),
            branch_summary: sanitize_title_for_branch(&title, 50),
            full_info: String::new(),
            platform_metadata: metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
