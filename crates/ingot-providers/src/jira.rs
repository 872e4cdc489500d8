// SPDX-License-Identifier: MIT OR Apache-2.0
//! Jira provider: input parsing and payload normalization.

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
    // Generic /browse/ shape covers Atlassian Cloud and self-hosted hosts.
    Regex::new(r"(?i)^https?://[^/]+/browse/(?P<ticket_id>[A-Z][A-Z0-9]*-\d+)").unwrap()
});
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?P<ticket_id>[A-Z][A-Z0-9]*-\d+)$").unwrap());
static NUMERIC_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

const PROMPT_TEMPLATE: &str = r#"Use your Jira tool to fetch issue {ticket_id}.

Return ONLY a valid JSON object with these fields (no markdown, no explanation).
Fields marked (optional) can be null if not available.

{
  "key": "PROJ-123",
  "summary": "ticket title",
  "description": "full description text",
  "status": "Open",
  "issuetype": "Bug",
  "assignee": null,
  "labels": ["label1", "label2"],
  "created": "2024-01-15T10:30:00Z",
  "updated": "2024-01-16T14:20:00Z",
  "priority": "High",
  "project": {"key": "PROJ", "name": "Project Name"}
}"#;

fn map_status(status_name: &str) -> TicketStatus {
    match status_name.to_lowercase().as_str() {
        "to do" | "open" | "backlog" | "new" | "reopened" => TicketStatus::Open,
        "in progress" | "in development" => TicketStatus::InProgress,
        "in review" | "code review" | "review" | "testing" | "qa" => TicketStatus::Review,
        "done" | "resolved" | "completed" => TicketStatus::Done,
        "closed" => TicketStatus::Closed,
        "blocked" | "on hold" | "waiting" => TicketStatus::Blocked,
        _ => TicketStatus::Unknown,
    }
}

fn map_type(type_name: &str) -> TicketType {
    match type_name.to_lowercase().as_str() {
        "story" | "feature" | "epic" | "user story" | "enhancement" | "new feature" => {
            TicketType::Feature
        }
        "bug" | "defect" | "incident" | "problem" => TicketType::Bug,
        "task" | "sub-task" | "subtask" | "spike" => TicketType::Task,
        "technical debt" | "improvement" | "refactor" | "maintenance" | "chore" => {
            TicketType::Maintenance
        }
        _ => TicketType::Unknown,
    }
}

/// Jira issue provider.
///
/// Accepts `/browse/` URLs from any host, `PROJECT-123` ids, and — only
/// when a default project is explicitly configured — bare numeric ids.
pub struct JiraProvider {
    default_project: Option<String>,
    base_url: Option<String>,
}

impl JiraProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(deps: &ProviderDeps) -> Self {
        Self {
            default_project: deps.config.default_jira_project.clone(),
            base_url: deps.config.jira_base_url.clone(),
        }
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::Jira,
            id: "jira",
            build: |deps| Arc::new(JiraProvider::new(deps)),
        }
    }

    /// Read a field that agent replies may flatten to a plain string where
    /// the REST API returns an object with a name.
    fn string_or_named(fields: &Value, key: &str, name_key: &str) -> String {
        match fields.get(key) {
            Some(Value::String(s)) => s.clone(),
            other => safe_nested_get(other, name_key, ""),
        }
    }

    fn browse_url(&self, raw: &Value, ticket_id: &str) -> String {
        // Prefer scheme+host recovered from the `self` API link.
        if let Some(api_url) = raw.get("self").and_then(Value::as_str)
            && let Some(host_end) = scheme_and_host(api_url)
        {
            return format!("{host_end}/browse/{ticket_id}");
        }
        // Fall back to the configured base URL; an empty URL beats a wrong
        // hardcoded one for self-hosted instances.
        match &self.base_url {
            Some(base) if !base.is_empty() => {
                format!("{}/browse/{ticket_id}", base.trim_end_matches('/'))
            }
            _ => String::new(),
        }
    }
}

/// Extract `scheme://host` from an absolute URL, if it has both.
fn scheme_and_host(url: &str) -> Option<String> {
    let scheme_end = url.find("://")?;
    let rest = &url[scheme_end + 3..];
    let host_end = rest.find('/').unwrap_or(rest.len());
    let host = &rest[..host_end];
    if host.is_empty() {
        return None;
    }
    Some(format!("{}://{host}", &url[..scheme_end]))
}

impl TicketProvider for JiraProvider {
    fn platform(&self) -> Platform {
        Platform::Jira
    }

    fn name(&self) -> &'static str {
        "Jira"
    }

    fn can_handle(&self, input: &str) -> bool {
        let input = input.trim();
        if URL_PATTERN.is_match(input) || ID_PATTERN.is_match(input) {
            return true;
        }
        // Bare numeric ids are ambiguous; claim them only when a default
        // project was explicitly configured.
        self.default_project.is_some() && NUMERIC_ID_PATTERN.is_match(input)
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        if let Some(caps) = URL_PATTERN.captures(input) {
            return Ok(caps["ticket_id"].to_uppercase());
        }
        if let Some(caps) = ID_PATTERN.captures(input) {
            return Ok(caps["ticket_id"].to_uppercase());
        }
        if NUMERIC_ID_PATTERN.is_match(input)
            && let Some(project) = &self.default_project
        {
            return Ok(format!("{}-{input}", project.to_uppercase()));
        }
        Err(TicketError::TicketIdFormat {
            platform: "Jira".into(),
            ticket_id: input.into(),
            expected: "PROJECT-123 or a /browse/ URL".into(),
        })
    }

    fn normalize(&self, raw: &Value, _ticket_id: Option<&str>) -> Result<GenericTicket> {
        let ticket_id = safe_nested_get(Some(raw), "key", "");
        if ticket_id.trim().is_empty() {
            return Err(TicketError::Validation(
                "cannot normalize Jira ticket: 'key' field is missing or empty".into(),
            ));
        }

        // Agent replies come flat; REST responses nest under "fields".
        let fields = match raw.get("fields") {
            Some(f @ Value::Object(_)) => f.clone(),
            _ if raw.get("summary").is_some() => raw.clone(),
            _ => Value::Object(Map::new()),
        };

        let status_name = Self::string_or_named(&fields, "status", "name");
        let type_name = Self::string_or_named(&fields, "issuetype", "name");
        let priority_name = Self::string_or_named(&fields, "priority", "name");
        let resolution_name = Self::string_or_named(&fields, "resolution", "name");
        let project_key = match fields.get("project") {
            Some(Value::String(s)) => s.clone(),
            other => safe_nested_get(other, "key", ""),
        };

        let assignee = match fields.get("assignee") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(obj @ Value::Object(_)) => {
                let name = safe_nested_get(Some(obj), "displayName", "");
                let name = if name.is_empty() {
                    safe_nested_get(Some(obj), "name", "")
                } else {
                    name
                };
                (!name.is_empty()).then_some(name)
            }
            _ => None,
        };

        let labels = fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|arr| {
                clean_labels(arr.iter().map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }))
            })
            .unwrap_or_default();

        let created_at = fields
            .get("created")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);
        let updated_at = fields
            .get("updated")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        let summary = match fields.get("summary") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        // Atlassian Document Format descriptions collapse to a placeholder;
        // the raw structure stays available in metadata.
        let (description, adf_description) = match fields.get("description") {
            Some(adf @ Value::Object(_)) => (
                "[Rich content - see platform_metadata.adf_description]".to_string(),
                Some(adf.clone()),
            ),
            Some(Value::String(s)) => (s.clone(), None),
            Some(Value::Null) | None => (String::new(), None),
            Some(other) => (other.to_string(), None),
        };

        let components: Vec<String> = fields
            .get("components")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|c| safe_nested_get(Some(c), "name", ""))
                    .collect()
            })
            .unwrap_or_default();

        let fix_versions: Vec<String> = fields
            .get("fixVersions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|v| safe_nested_get(Some(v), "name", ""))
                    .collect()
            })
            .unwrap_or_default();

        let story_points = match fields.get("customfield_10016") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.parse().unwrap_or(0.0),
            _ => 0.0,
        };
        let epic_link = match fields.get("customfield_10014") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let api_url = raw.get("self").and_then(Value::as_str).unwrap_or("");
        let url = self.browse_url(raw, &ticket_id);

        let mut metadata = Map::new();
        metadata.insert("raw_response".into(), raw.clone());
        metadata.insert("project_key".into(), json!(project_key));
        metadata.insert("priority_label".into(), json!(priority_name));
        metadata.insert("epic_link".into(), json!(epic_link));
        metadata.insert("story_points".into(), json!(story_points));
        metadata.insert("components".into(), json!(components));
        metadata.insert(
            "issue_type_id".into(),
            json!(safe_nested_get(fields.get("issuetype"), "id", "")),
        );
        metadata.insert("resolution".into(), json!(resolution_name));
        metadata.insert("fix_versions".into(), json!(fix_versions));
        metadata.insert("api_url".into(), json!(api_url));
        if let Some(adf) = adf_description {
            metadata.insert("adf_description".into(), adf);
        }

        Ok(GenericTicket {
            id: ticket_id,
            platform: Platform::Jira,
            url,
            title: summary.clone(),
            description,
            status: map_status(&status_name),
            ticket_type: map_type(&type_name),
            assignee,
            labels,
            created_at,
            updated_at,
            branch_summary: sanitize_title_for_branch(&summary, 50),
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
