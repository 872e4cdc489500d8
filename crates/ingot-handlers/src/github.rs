// SPDX-License-Identifier: MIT OR Apache-2.0
//! GitHub REST API handler.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::{Result, TicketError};
use regex::Regex;
use serde_json::Value;

use crate::handler::{PlatformHandler, RequestSpec};

static TICKET_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^/]+)/([^#]+)#(\d+)$").unwrap());

/// Handler for the GitHub REST API v3.
///
/// Credential keys: `token`. Ticket ids are `owner/repo#number`.
#[derive(Debug)]
pub struct GithubHandler {
    api_url: String,
}

impl Default for GithubHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl GithubHandler {
    /// Handler against the public GitHub API.
    pub fn new() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
        }
    }

    /// Handler against a custom API root (tests, GitHub Enterprise).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into() }
    }

    fn parse_ticket_id(&self, ticket_id: &str) -> Result<(String, String, u64)> {
        let caps = TICKET_ID_PATTERN.captures(ticket_id).ok_or_else(|| {
            TicketError::TicketIdFormat {
                platform: self.platform_name().to_string(),
                ticket_id: ticket_id.to_string(),
                expected: "owner/repo#number".to_string(),
            }
        })?;
        let number = caps[3].parse().map_err(|_| TicketError::TicketIdFormat {
            platform: self.platform_name().to_string(),
            ticket_id: ticket_id.to_string(),
            expected: "owner/repo#number".to_string(),
        })?;
        Ok((caps[1].to_string(), caps[2].to_string(), number))
    }
}

#[async_trait]
impl PlatformHandler for GithubHandler {
    fn platform_name(&self) -> &'static str {
        "GitHub"
    }

    fn required_credential_keys(&self) -> &'static [&'static str] {
        &["token"]
    }

    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value> {
        self.validate_credentials(credentials)?;
        let (owner, repo, number) = self.parse_ticket_id(ticket_id)?;

        let mut spec = RequestSpec::get(format!(
            "{}/repos/{owner}/{repo}/issues/{number}",
            self.api_url
        ));
        spec.headers.push((
            "Authorization",
            format!("Bearer {}", credentials["token"]),
        ));
        spec.headers.push(("Accept", "application/vnd.github.v3+json".into()));
        spec.headers.push(("User-Agent", "ingot-ticket-service".into()));
        spec.timeout = timeout;

        spec.execute(client, self.platform_name(), ticket_id).await
    }
}
