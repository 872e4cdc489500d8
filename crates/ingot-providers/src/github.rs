// SPDX-License-Identifier: MIT OR Apache-2.0
//! GitHub provider: input parsing and REST payload normalization.

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

static GITHUB_COM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://github\.com/(?P<owner>[^/]+)/(?P<repo>[^/]+)/(?:issues|pull)/(?P<number>\d+)",
    )
    .unwrap()
});
static GENERIC_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?P<host>[^/]+)/(?P<owner>[^/]+)/(?P<repo>[^/]+)/(?:issues|pull)/(?P<number>\d+)",
    )
    .unwrap()
});
static SHORT_REF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<owner>[^/\s]+)/(?P<repo>[^/#\s]+)#(?P<number>\d+)$").unwrap());
static BARE_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?P<number>\d+)$").unwrap());
static REPO_FROM_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^/]+/([^/]+)/([^/]+)/").unwrap());
static PULL_SEGMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pull/\d+").unwrap());

const PROMPT_TEMPLATE: &str = r#"Use your GitHub API tool to fetch issue or PR {ticket_id}.

The ticket_id format is "owner/repo#number" (e.g., "microsoft/vscode#12345").

Return ONLY a valid JSON object with these fields (no markdown, no explanation).
Fields can be null if not available.

{
  "number": 123,
  "title": "issue/PR title",
  "body": "full description text",
  "state": "open",
  "user": {"login": "username"},
  "labels": [{"name": "label1"}],
  "created_at": "2024-01-15T10:30:00Z",
  "updated_at": "2024-01-16T14:20:00Z",
  "html_url": "https://github.com/owner/repo/issues/123",
  "milestone": null,
  "assignee": null
}"#;

/// Label-based status refinement for open issues.
fn status_from_label(label: &str) -> Option<TicketStatus> {
    match label {
        "in progress" | "in-progress" | "wip" => Some(TicketStatus::InProgress),
        "review" | "needs review" | "awaiting review" => Some(TicketStatus::Review),
        "blocked" | "on hold" => Some(TicketStatus::Blocked),
        _ => None,
    }
}

const TYPE_KEYWORDS: &[(TicketType, &[&str])] = &[
    (TicketType::Bug, &["bug", "defect", "fix", "error", "crash", "regression"]),
    (TicketType::Feature, &["feature", "enhancement", "feat", "story", "request"]),
    (TicketType::Task, &["task", "chore", "todo", "housekeeping", "spike"]),
    (
        TicketType::Maintenance,
        &["maintenance", "tech-debt", "tech debt", "refactor", "cleanup", "infrastructure", "deps", "dependencies", "devops"],
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
    TicketType::Unknown
}

/// GitHub Issues and Pull Requests provider.
///
/// Secure by default: URLs outside `github.com` are accepted only when an
/// Enterprise host is explicitly configured, and bare `#123` references only
/// when both default owner and repo are configured.
pub struct GithubProvider {
    default_owner: Option<String>,
    default_repo: Option<String>,
    enterprise_host: Option<String>,
}

enum UrlCheck<'a> {
    Allowed(regex::Captures<'a>),
    ForbiddenHost(String),
    NotAUrl,
}

impl GithubProvider {
    /// Build a provider from the injected dependency bundle.
    pub fn new(deps: &ProviderDeps) -> Self {
        Self {
            default_owner: deps.config.default_github_owner.clone(),
            default_repo: deps.config.default_github_repo.clone(),
            enterprise_host: deps
                .config
                .github_enterprise_host
                .as_deref()
                .map(normalize_host),
        }
    }

    /// Registry factory for this provider.
    pub fn factory() -> ProviderFactory {
        ProviderFactory {
            platform: Platform::Github,
            id: "github",
            build: |deps| Arc::new(GithubProvider::new(deps)),
        }
    }

    fn has_explicit_defaults(&self) -> bool {
        self.default_owner.is_some() && self.default_repo.is_some()
    }

    fn check_url<'a>(&self, input: &'a str) -> UrlCheck<'a> {
        if let Some(caps) = GITHUB_COM_PATTERN.captures(input) {
            return UrlCheck::Allowed(caps);
        }
        if let Some(caps) = GENERIC_URL_PATTERN.captures(input) {
            let host = caps["host"].to_lowercase();
            if Some(host.as_str()) == self.enterprise_host.as_deref() {
                return UrlCheck::Allowed(caps);
            }
            return UrlCheck::ForbiddenHost(host);
        }
        UrlCheck::NotAUrl
    }
}

/// Strip scheme, path, and trailing slashes from a configured host value.
fn normalize_host(value: &str) -> String {
    let stripped = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .unwrap_or(value);
    stripped
        .trim_end_matches('/')
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

impl TicketProvider for GithubProvider {
    fn platform(&self) -> Platform {
        Platform::Github
    }

    fn name(&self) -> &'static str {
        "GitHub Issues"
    }

    fn can_handle(&self, input: &str) -> bool {
        let input = input.trim();
        if matches!(self.check_url(input), UrlCheck::Allowed(_)) {
            return true;
        }
        if SHORT_REF_PATTERN.is_match(input) {
            return true;
        }
        self.has_explicit_defaults() && BARE_NUMBER_PATTERN.is_match(input)
    }

    fn parse_input(&self, input: &str) -> Result<String> {
        let input = input.trim();
        match self.check_url(input) {
            UrlCheck::Allowed(caps) => {
                return Ok(format!(
                    "{}/{}#{}",
                    &caps["owner"], &caps["repo"], &caps["number"]
                ));
            }
            UrlCheck::ForbiddenHost(host) => {
                return Err(TicketError::TicketIdFormat {
                    platform: "GitHub".into(),
                    ticket_id: input.into(),
                    expected: format!(
                        "a github.com URL (host '{host}' is not allowed without an \
                         explicitly configured Enterprise host)"
                    ),
                });
            }
            UrlCheck::NotAUrl => {}
        }
        if let Some(caps) = SHORT_REF_PATTERN.captures(input) {
            return Ok(format!(
                "{}/{}#{}",
                &caps["owner"], &caps["repo"], &caps["number"]
            ));
        }
        if let Some(caps) = BARE_NUMBER_PATTERN.captures(input)
            && let (Some(owner), Some(repo)) = (&self.default_owner, &self.default_repo)
        {
            return Ok(format!("{owner}/{repo}#{}", &caps["number"]));
        }
        Err(TicketError::TicketIdFormat {
            platform: "GitHub".into(),
            ticket_id: input.into(),
            expected: "owner/repo#number, an issue/PR URL, or #number with configured defaults"
                .into(),
        })
    }

    fn normalize(&self, raw: &Value, _ticket_id: Option<&str>) -> Result<GenericTicket> {
        let html_url = raw.get("html_url").and_then(Value::as_str).unwrap_or("");

        let mut repo_full_name = safe_nested_get(raw.get("repository"), "full_name", "");
        if repo_full_name.is_empty()
            && let Some(caps) = REPO_FROM_URL_PATTERN.captures(html_url)
        {
            repo_full_name = format!("{}/{}", &caps[1], &caps[2]);
        }

        let number = raw.get("number").and_then(Value::as_u64).unwrap_or(0);
        if number == 0 {
            return Err(TicketError::Validation(
                "cannot normalize GitHub issue: 'number' field is missing".into(),
            ));
        }
        let ticket_id = if repo_full_name.is_empty() {
            number.to_string()
        } else {
            format!("{repo_full_name}#{number}")
        };

        let state = raw
            .get("state")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_lowercase();
        let state_reason = raw
            .get("state_reason")
            .and_then(Value::as_str)
            .unwrap_or("");

        // PR detection: the field when present, the URL shape when not
        // (agent replies may omit pull_request entirely).
        let is_pr = !matches!(raw.get("pull_request"), None | Some(Value::Null))
            || PULL_SEGMENT_PATTERN.is_match(html_url);
        let merged_at = raw.get("merged_at").and_then(Value::as_str);

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

        let mut status = map_status(&state, state_reason, is_pr, merged_at);
        if state == "open" {
            status = labels
                .iter()
                .find_map(|l| status_from_label(l.to_lowercase().trim()))
                .unwrap_or(status);
        }

        let assignee = match raw.get("assignee") {
            Some(obj @ Value::Object(_)) => {
                let login = safe_nested_get(Some(obj), "login", "");
                (!login.is_empty()).then_some(login)
            }
            _ => raw
                .get("assignees")
                .and_then(Value::as_array)
                .and_then(|arr| arr.first())
                .map(|first| safe_nested_get(Some(first), "login", ""))
                .filter(|login| !login.is_empty()),
        };

        let title = raw.get("title").and_then(Value::as_str).unwrap_or("");
        let milestone = safe_nested_get(raw.get("milestone"), "title", "");

        let mut metadata = Map::new();
        metadata.insert("raw_response".into(), raw.clone());
        metadata.insert("repository".into(), json!(repo_full_name));
        metadata.insert("issue_number".into(), json!(number));
        metadata.insert("is_pull_request".into(), json!(is_pr));
        metadata.insert("state_reason".into(), json!(state_reason));
        metadata.insert("milestone".into(), json!(milestone));
        metadata.insert(
            "author".into(),
            json!(safe_nested_get(raw.get("user"), "login", "")),
        );

        Ok(GenericTicket {
            id: ticket_id,
            platform: Platform::Github,
            url: html_url.to_string(),
            title: title.to_string(),
            description: raw
                .get("body")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
            status,
            ticket_type: map_type(&labels),
            assignee,
            labels,
            created_at: raw
                .get("created_at")
                .and_then(Value::as_str)
                .and_then(parse_timestamp),
            updated_at: raw
                .get("updated_at")
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

fn map_status(state: &str, state_reason: &str, is_pr: bool, merged_at: Option<&str>) -> TicketStatus {
    if is_pr && merged_at.is_some_and(|m| !m.is_empty()) {
        return TicketStatus::Done;
    }
    if state == "closed" {
        match state_reason.to_lowercase().as_str() {
            "completed" => return TicketStatus::Done,
            "not_planned" => return TicketStatus::Closed,
            _ => {}
        }
    }
    match state {
        "open" => TicketStatus::Open,
        "closed" => TicketStatus::Closed,
        _ => TicketStatus::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
