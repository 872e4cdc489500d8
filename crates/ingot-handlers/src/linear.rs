// SPDX-License-Identifier: MIT OR Apache-2.0
//! Linear GraphQL API handler.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::Result;
use serde_json::{Value, json};

use crate::handler::{GraphQlRequest, PlatformHandler, RequestSpec};

/// Issue lookup by team-scoped identifier (`ENG-42`), not by UUID.
const ISSUE_QUERY: &str = r#"
query GetIssue($identifier: String!) {
  issueByIdentifier(identifier: $identifier) {
    id
    identifier
    title
    description
    state { name type }
    assignee { name email }
    labels { nodes { name } }
    createdAt
    updatedAt
    priority
    priorityLabel
    team { key name }
    cycle { name }
    parent { identifier }
    url
  }
}
"#;

/// Handler for the Linear GraphQL API.
///
/// Credential keys: `api_key`. Linear takes the key directly in the
/// `Authorization` header with no `Bearer` prefix — that is its documented
/// convention.
#[derive(Debug)]
pub struct LinearHandler {
    api_url: String,
}

impl Default for LinearHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearHandler {
    /// Handler against api.linear.app.
    pub fn new() -> Self {
        Self {
            api_url: "https://api.linear.app/graphql".to_string(),
        }
    }

    /// Handler against a custom GraphQL endpoint (tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into() }
    }
}

#[async_trait]
impl PlatformHandler for LinearHandler {
    fn platform_name(&self) -> &'static str {
        "Linear"
    }

    fn required_credential_keys(&self) -> &'static [&'static str] {
        &["api_key"]
    }

    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value> {
        self.validate_credentials(credentials)?;

        let payload = json!({
            "query": ISSUE_QUERY,
            "variables": {"identifier": ticket_id},
        });
        let mut spec = RequestSpec::post_json(self.api_url.clone(), payload);
        // Bare key, no Bearer prefix.
        spec.headers.push(("Authorization", credentials["api_key"].clone()));
        spec.headers.push(("Content-Type", "application/json".into()));
        spec.timeout = timeout;

        GraphQlRequest { spec }
            .execute(client, self.platform_name(), ticket_id, |data| {
                match data.get("issueByIdentifier") {
                    Some(Value::Null) | None => None,
                    Some(issue) => Some(issue.clone()),
                }
            })
            .await
    }
}
