// SPDX-License-Identifier: MIT OR Apache-2.0
//! Jira REST API handler.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::Result;
use serde_json::Value;

use crate::handler::{PlatformHandler, RequestSpec};

/// Handler for the Jira REST API v3.
///
/// Credential keys: `url` (instance base URL), `email`, `token`. The base
/// URL is normalized by stripping trailing slashes, so
/// `https://x.atlassian.net` and `https://x.atlassian.net/` build the same
/// endpoint.
#[derive(Debug, Default)]
pub struct JiraHandler;

impl JiraHandler {
    /// Create a handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlatformHandler for JiraHandler {
    fn platform_name(&self) -> &'static str {
        "Jira"
    }

    fn required_credential_keys(&self) -> &'static [&'static str] {
        &["url", "email", "token"]
    }

    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value> {
        self.validate_credentials(credentials)?;

        let base_url = credentials["url"].trim_end_matches('/');
        let mut spec = RequestSpec::get(format!("{base_url}/rest/api/3/issue/{ticket_id}"));
        spec.headers.push(("Accept", "application/json".into()));
        spec.basic_auth = Some((credentials["email"].clone(), credentials["token"].clone()));
        spec.timeout = timeout;

        spec.execute(client, self.platform_name(), ticket_id).await
    }
}
