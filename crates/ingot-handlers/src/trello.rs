// SPDX-License-Identifier: MIT OR Apache-2.0
//! Trello REST API handler.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::Result;
use serde_json::Value;

use crate::handler::{PlatformHandler, RequestSpec};

/// Handler for the Trello REST API.
///
/// Credential keys: `api_key`, `token`, both sent as query-string
/// parameters per Trello's authentication scheme.
#[derive(Debug)]
pub struct TrelloHandler {
    api_url: String,
}

impl Default for TrelloHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TrelloHandler {
    /// Handler against api.trello.com.
    pub fn new() -> Self {
        Self {
            api_url: "https://api.trello.com/1".to_string(),
        }
    }

    /// Handler against a custom API root (tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into() }
    }
}

#[async_trait]
impl PlatformHandler for TrelloHandler {
    fn platform_name(&self) -> &'static str {
        "Trello"
    }

    fn required_credential_keys(&self) -> &'static [&'static str] {
        &["api_key", "token"]
    }

    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value> {
        self.validate_credentials(credentials)?;

        let mut spec = RequestSpec::get(format!("{}/cards/{ticket_id}", self.api_url));
        spec.query.push(("key", credentials["api_key"].clone()));
        spec.query.push(("token", credentials["token"].clone()));
        spec.timeout = timeout;

        spec.execute(client, self.platform_name(), ticket_id).await
    }
}
