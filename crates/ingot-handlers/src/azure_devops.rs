// SPDX-License-Identifier: MIT OR Apache-2.0
//! Azure DevOps REST API handler.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::{Result, TicketError};
use serde_json::Value;

use crate::handler::{PlatformHandler, RequestSpec};

/// Azure DevOps REST API version sent with every request.
const API_VERSION: &str = "7.0";

/// Handler for the Azure DevOps work item REST API.
///
/// Credential keys: `organization`, `pat`. Authentication is basic auth
/// with an empty username and the PAT as password. Ticket ids arrive as
/// `org/Project#id`; the handler uses the project and work item id (the
/// organization comes from credentials).
#[derive(Debug)]
pub struct AzureDevopsHandler {
    base_url: String,
}

impl Default for AzureDevopsHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl AzureDevopsHandler {
    /// Handler against dev.azure.com.
    pub fn new() -> Self {
        Self {
            base_url: "https://dev.azure.com".to_string(),
        }
    }

    /// Handler against a custom API root (tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    /// Parse `org/Project#id` (or `Project#id`) into project and work item id.
    fn parse_ticket_id(&self, ticket_id: &str) -> Result<(String, u64)> {
        let invalid = || TicketError::TicketIdFormat {
            platform: self.platform_name().to_string(),
            ticket_id: ticket_id.to_string(),
            expected: "org/Project#WorkItemID".to_string(),
        };
        let (left, id) = ticket_id.rsplit_once('#').ok_or_else(invalid)?;
        let work_item_id: u64 = id.parse().map_err(|_| invalid())?;
        let project = match left.rsplit_once('/') {
            Some((_org, project)) => project,
            None => left,
        };
        if project.is_empty() {
            return Err(invalid());
        }
        Ok((project.to_string(), work_item_id))
    }
}

#[async_trait]
impl PlatformHandler for AzureDevopsHandler {
    fn platform_name(&self) -> &'static str {
        "Azure DevOps"
    }

    fn required_credential_keys(&self) -> &'static [&'static str] {
        &["organization", "pat"]
    }

    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value> {
        self.validate_credentials(credentials)?;
        let (project, work_item_id) = self.parse_ticket_id(ticket_id)?;
        let organization = &credentials["organization"];

        let mut spec = RequestSpec::get(format!(
            "{}/{organization}/{project}/_apis/wit/workitems/{work_item_id}",
            self.base_url
        ));
        spec.headers.push(("Accept", "application/json".into()));
        spec.query.push(("api-version", API_VERSION.into()));
        spec.basic_auth = Some((String::new(), credentials["pat"].clone()));
        spec.timeout = timeout;

        spec.execute(client, self.platform_name(), ticket_id).await
    }
}
