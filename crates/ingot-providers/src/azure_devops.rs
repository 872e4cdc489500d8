// SPDX-License-Identifier: MIT OR Apache-2.0
//! Azure DevOps provider: work item parsing and normalization.

use std::sync::{Arc, LazyLock};

use ingot_core::{
    GenericTicket, Platform, TicketStatus, TicketType, clean_labels, parse_timestamp,
    safe_nested_get, safe_nested_value, sanitize_title_for_branch,
};
use ingot_error::{Result, TicketError};
use regex::Regex;
use serde_json::{Map, Value, json};

use crate::provider::{ProviderDeps, TicketProvider};
use crate::registry::ProviderFactory;

static DEV_AZURE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://dev\.azure\.com/(?P<org>[^/]+)/(?P<project>[^/]+)/_workitems/edit/(?P<id>\d+)",
    )
    .unwrap()
});
static VISUALSTUDIO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?P<org>[^.]+)\.visualstudio\.com/(?P<project>[^/]+)/_workitems/edit/(?P<id>\d+)",
    )
    .unwrap()
});
static AB_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^AB#(?P<id>\d+)$").unwrap());

fn map_status(state: &str) -> TicketStatus {
    match state.to_lowercase().as_str() {
        "new" | "to do" => TicketStatus::Open,
        "active" | "in progress" | "committed" => TicketStatus::InProgress,
        "resolved" => TicketStatus::Review,
        "closed" | "done" => TicketStatus::Done,
        "removed" => TicketStatus::Closed,
        _ => TicketStatus::Unknown,
    }
}

fn map_type(work_item_type: &str) -> TicketType {
    match work_item_type.to_lowercase().as_str() {
        "bug" | "defect" | "impediment" | "issue" => TicketType::Bug,
        "user story" | "feature" | "product backlog item" | "epic" | "requirement" => {
            TicketType::Feature
        }
        "task" | "spike" => TicketType::Task,
        "tech debt" | "change request" => TicketType::Maintenance,
        _ => TicketType::Unknown,
    }
}

/// Strip HTML tags from a work item description, decoding the handful of
/// entities Azure DevOps emits.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .trim()
        .to_string()
}

/// Azure DevOps Boards work item provider.
///
/// Direct-API is the only fetch path for this platform; no prompt template
/// is defined.
pub struct AzureDevopsProvider {
    default_org: Option<String>,
    default_project: Option<String>,
}

impl AzureDevopsProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(deps: &ProviderDeps) -> Self {
        Self {
            default_org: deps.config.azure_default_org.clone(),
            default_project: deps.config.azure_default_project.clone(),
        }
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::AzureDevops,
            id: "azure_devops",
            build: |deps| Arc::new(AzureDevopsProvider::new(deps)),
        }
    }
}

impl TicketProvider for AzureDevopsProvider {
    fn platform(&self) -> Platform {
        Platform::AzureDevops
    }

    fn name(&self) -> &'static str {
        "Azure DevOps"
    }

    fn can_handle(&self, input: &str) -> bool {
        let input = input.trim();
        DEV_AZURE_PATTERN.is_match(input)
            || VISUALSTUDIO_PATTERN.is_match(input)
            || AB_PATTERN.is_match(input)
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        for pattern in [&*DEV_AZURE_PATTERN, &*VISUALSTUDIO_PATTERN] {
            if let Some(caps) = pattern.captures(input) {
                return Ok(format!(
                    "{}/{}#{}",
                    &caps["org"], &caps["project"], &caps["id"]
                ));
            }
        }
        if let Some(caps) = AB_PATTERN.captures(input) {
            let (Some(org), Some(project)) = (&self.default_org, &self.default_project) else {
                return Err(TicketError::TicketIdFormat {
                    platform: "Azure DevOps".into(),
                    ticket_id: input.into(),
                    expected: "AB#123 requires configured default organization and project".into(),
                });
            };
            return Ok(format!("{org}/{project}#{}", &caps["id"]));
        }
        Err(TicketError::TicketIdFormat {
            platform: "Azure DevOps".into(),
            ticket_id: input.into(),
            expected: "a dev.azure.com work item URL or AB#123".into(),
        })
    }

    fn normalize(&self, raw: &Value, _ticket_id: Option<&str>) -> Result<GenericTicket> {
        let work_item_id = safe_nested_get(Some(raw), "id", "");
        if work_item_id.is_empty() {
            return Err(TicketError::Validation(
                "cannot normalize Azure DevOps work item: 'id' field missing".into(),
            ));
        }

        let fields = match raw.get("fields") {
            Some(f @ Value::Object(_)) => f.clone(),
            _ => Value::Object(Map::new()),
        };

        let raw_url = safe_nested_get(Some(raw), "url", "");
        let (mut org, mut project) = (String::new(), String::new());
        if let Some(caps) = DEV_AZURE_PATTERN.captures(&raw_url) {
            org = caps["org"].to_string();
            project = caps["project"].to_string();
        }

        let ticket_id = if !org.is_empty() && !project.is_empty() {
            format!("{org}/{project}#{work_item_id}")
        } else {
            work_item_id.clone()
        };

        let title = safe_nested_get(Some(&fields), "System.Title", "");
        let description = strip_html(&safe_nested_get(Some(&fields), "System.Description", ""));
        let state = safe_nested_get(Some(&fields), "System.State", "");
        let work_item_type = safe_nested_get(Some(&fields), "System.WorkItemType", "");

        let assigned_to = fields.get("System.AssignedTo");
        let assignee_name = safe_nested_get(assigned_to, "displayName", "");
        let assignee = (!assignee_name.is_empty()).then_some(assignee_name);

        let tags = safe_nested_get(Some(&fields), "System.Tags", "");
        let labels = clean_labels(tags.split(';'));

        let created_at = parse_timestamp(&safe_nested_get(Some(&fields), "System.CreatedDate", ""));
        let updated_at = parse_timestamp(&safe_nested_get(Some(&fields), "System.ChangedDate", ""));

        // Browse URL: prefer the human-friendly _links.html.href; the raw
        // `url` field is usually an API endpoint.
        let html_link = safe_nested_value(raw.get("_links"), "html");
        let mut browse_url = safe_nested_get(html_link, "href", "");
        if browse_url.is_empty() {
            if !raw_url.is_empty() && !raw_url.contains("_apis") {
                browse_url = raw_url.clone();
            } else if !org.is_empty() && !project.is_empty() {
                browse_url =
                    format!("https://dev.azure.com/{org}/{project}/_workitems/edit/{work_item_id}");
            }
        }

        let mut metadata = Map::new();
        metadata.insert("organization".into(), json!(org));
        metadata.insert("project".into(), json!(project));
        metadata.insert("work_item_type".into(), json!(work_item_type));
        metadata.insert("state_name".into(), json!(state));
        metadata.insert(
            "area_path".into(),
            json!(safe_nested_get(Some(&fields), "System.AreaPath", "")),
        );
        metadata.insert(
            "iteration_path".into(),
            json!(safe_nested_get(Some(&fields), "System.IterationPath", "")),
        );
        metadata.insert(
            "assigned_to_email".into(),
            json!(safe_nested_get(assigned_to, "uniqueName", "")),
        );
        metadata.insert("revision".into(), raw.get("rev").cloned().unwrap_or(Value::Null));

        Ok(GenericTicket {
            id: ticket_id,
            platform: Platform::AzureDevops,
            url: browse_url,
            title: title.clone(),
            description,
            status: map_status(&state),
            ticket_type: map_type(&work_item_type),
            assignee,
            labels,
            created_at,
            updated_at,
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
    use crate::provider::ProviderConfig;

    fn provider() -> AzureDevopsProvider {
        AzureDevopsProvider::new(&ProviderDeps::default())
    }

    #[test]
    fn handles_urls_and_shorthand() {
        let p = provider();
        assert!(p.can_handle("https://dev.azure.com/org/proj/_workitems/edit/123"));
        assert!(p.can_handle("https://myorg.visualstudio.com/proj/_workitems/edit/9"));
        assert!(p.can_handle("AB#123"));
        assert!(p.can_handle("ab#123"));
        assert!(!p.can_handle("AB123"));
    }

    #[test]
    fn parse_builds_composite_id() {
        let p = provider();
        assert_eq!(
            p.parse_input("https://dev.azure.com/org/proj/_workitems/edit/123").unwrap(),
            "org/proj#123"
        );
        assert_eq!(
            p.parse_input("https://myorg.visualstudio.com/proj/_workitems/edit/9").unwrap(),
            "myorg/proj#9"
        );
    }

    #[test]
    fn ab_shorthand_requires_defaults() {
        assert!(provider().parse_input("AB#7").is_err());

        let p = AzureDevopsProvider::new(&ProviderDeps {
            config: ProviderConfig {
                azure_default_org: Some("org".into()),
                azure_default_project: Some("proj".into()),
                ..ProviderConfig::default()
            },
            ..ProviderDeps::default()
        });
        assert_eq!(p.parse_input("AB#7").unwrap(), "org/proj#7");
    }

    fn work_item() -> Value {
        json!({
            "id": 123,
            "rev": 4,
            "url": "https://dev.azure.com/org/proj/_apis/wit/workItems/123",
            "_links": {"html": {"href": "https://dev.azure.com/org/proj/_workitems/edit/123"}},
            "fields": {
                "System.Title": "Fix the pipeline",
                "System.Description": "<div>Broken <b>badly</b>&nbsp;now</div>",
                "System.State": "Active",
                "System.WorkItemType": "Bug",
                "System.Tags": "infra; ci ;",
                "System.AssignedTo": {"displayName": "Pat", "uniqueName": "pat@org.com"},
                "System.CreatedDate": "2024-01-15T10:30:00Z",
                "System.ChangedDate": "2024-01-16T14:20:00Z",
                "System.AreaPath": "proj\\platform",
                "System.IterationPath": "proj\\sprint-9"
            }
        })
    }

    #[test]
    fn normalizes_work_item() {
        let t = provider().normalize(&work_item(), None).unwrap();
        // org/project come from the API url; the id is composite.
        assert_eq!(t.id, "org/proj#123");
        assert_eq!(t.url, "https://dev.azure.com/org/proj/_workitems/edit/123");
        assert_eq!(t.title, "Fix the pipeline");
        assert_eq!(t.description, "Broken badly now");
        assert_eq!(t.status, TicketStatus::InProgress);
        assert_eq!(t.ticket_type, TicketType::Bug);
        assert_eq!(t.assignee.as_deref(), Some("Pat"));
        assert_eq!(t.labels, vec!["infra", "ci"]);
        assert_eq!(t.platform_metadata["assigned_to_email"], json!("pat@org.com"));
        assert_eq!(t.platform_metadata["revision"], json!(4));
    }

    #[test]
    fn api_url_never_used_as_browse_url() {
        let mut raw = work_item();
        raw.as_object_mut().unwrap().remove("_links");
        let t = provider().normalize(&raw, None).unwrap();
        // Falls through to the constructed dev.azure.com browse URL.
        assert_eq!(t.url, "https://dev.azure.com/org/proj/_workitems/edit/123");
    }

    #[test]
    fn missing_id_is_fatal() {
        assert!(provider().normalize(&json!({"fields": {}}), None).is_err());
    }

    #[test]
    fn resolved_maps_to_review() {
        assert_eq!(map_status("Resolved"), TicketStatus::Review);
        assert_eq!(map_status("Removed"), TicketStatus::Closed);
        assert_eq!(map_status("Weird"), TicketStatus::Unknown);
    }

    #[test]
    fn no_prompt_template() {
        assert_eq!(provider().prompt_template(), "");
    }

    #[test]
    fn strip_html_handles_entities() {
        assert_eq!(strip_html("<p>a &amp; b</p>"), "a & b");
        assert_eq!(strip_html(""), "");
    }
}
