// SPDX-License-Identifier: MIT OR Apache-2.0
//! Prompt templates and validation sets for agent-mediated fetching.
//!
//! Mediated fetch is a closed capability: only Jira, Linear, and GitHub
//! have backend tool integrations. Each template asks for exactly one JSON
//! object and carries a single `{ticket_id}` slot; the required-field sets
//! are the minimum a provider needs to normalize the reply.

use ingot_core::Platform;

/// Platforms servable through backend tool integrations.
pub const MEDIATED_PLATFORMS: &[Platform] =
    &[Platform::Jira, Platform::Linear, Platform::Github];

/// Whether `platform` is in the mediated-fetch set.
pub fn supports_mediated_fetch(platform: Platform) -> bool {
    MEDIATED_PLATFORMS.contains(&platform)
}

/// Minimum top-level fields a mediated reply must carry for `platform`.
pub fn required_fields(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Jira => &["key", "summary"],
        Platform::Linear => &["identifier", "title"],
        Platform::Github => &["number", "title"],
        _ => &[],
    }
}

/// The structured prompt for `platform`, or `None` outside the mediated set.
pub fn prompt_template(platform: Platform) -> Option<&'static str> {
    match platform {
        Platform::Jira => Some(JIRA_PROMPT),
        Platform::Linear => Some(LINEAR_PROMPT),
        Platform::Github => Some(GITHUB_PROMPT),
        _ => None,
    }
}

/// Render the prompt for `platform`, substituting the ticket id.
pub fn build_prompt(platform: Platform, ticket_id: &str) -> Option<String> {
    prompt_template(platform).map(|template| template.replace("{ticket_id}", ticket_id))
}

const JIRA_PROMPT: &str = r#"Use your Jira tool to fetch issue {ticket_id}.

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

const LINEAR_PROMPT: &str = r#"Use your Linear tool to fetch issue {ticket_id}.

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

const GITHUB_PROMPT: &str = r#"Use your GitHub API tool to fetch issue or PR {ticket_id}.

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
