// SPDX-License-Identifier: MIT OR Apache-2.0
//! Monday.com GraphQL API handler.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::{Result, TicketError};
use serde_json::{Value, json};

use crate::handler::{GraphQlRequest, PlatformHandler, RequestSpec};

/// Item lookup by id. `column_values` is the stable access path for custom
/// columns; `updates` feeds the description fallback chain.
const ITEM_QUERY: &str = r#"
query GetItem($itemId: ID!) {
  items(ids: [$itemId]) {
    id
    name
    state
    column_values {
      id
      type
      title
      text
    }
    created_at
    updated_at
    board { id name }
    group { id title }
    creator { name }
    updates { text_body body }
  }
}
"#;

/// Handler for the Monday.com GraphQL API (v2).
///
/// Credential keys: `api_key`, passed directly in the `Authorization`
/// header with no `Bearer` prefix — Monday's documented convention.
/// Ticket ids arrive as the composite `slug:board:item` produced by the
/// provider; the handler queries by the item id.
#[derive(Debug)]
pub struct MondayHandler {
    api_url: String,
}

impl Default for MondayHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl MondayHandler {
    /// Handler against api.monday.com.
    pub fn new() -> Self {
        Self {
            api_url: "https://api.monday.com/v2".to_string(),
        }
    }

    /// Handler against a custom GraphQL endpoint (tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into() }
    }

    /// Pull the item id out of `slug:board:item`, `board:item`, or a bare
    /// item id.
    fn item_id<'a>(&self, ticket_id: &'a str) -> Result<&'a str> {
        let item = ticket_id.rsplit(':').next().unwrap_or("");
        if item.is_empty() || !item.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TicketError::TicketIdFormat {
                platform: self.platform_name().to_string(),
                ticket_id: ticket_id.to_string(),
                expected: "slug:board:item with a numeric item id".to_string(),
            });
        }
        Ok(item)
    }
}

#[async_trait]
impl PlatformHandler for MondayHandler {
    fn platform_name(&self) -> &'static str {
        "Monday"
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
        let item_id = self.item_id(ticket_id)?;

        let payload = json!({
            "query": ITEM_QUERY,
            "variables": {"itemId": item_id},
        });
        let mut spec = RequestSpec::post_json(self.api_url.clone(), payload);
        // Bare key, no Bearer prefix.
        spec.headers.push(("Authorization", credentials["api_key"].clone()));
        spec.headers.push(("Content-Type", "application/json".into()));
        spec.timeout = timeout;

        GraphQlRequest { spec }
            .execute(client, self.platform_name(), ticket_id, |data| {
                data.get("items")
                    .and_then(Value::as_array)
                    .and_then(|items| items.first())
                    .cloned()
            })
            .await
    }
}
