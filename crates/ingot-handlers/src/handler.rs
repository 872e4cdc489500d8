// SPDX-License-Identifier: MIT OR Apache-2.0
//! The handler contract and shared request execution.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use ingot_error::{Result, TicketError};
use serde_json::Value;
use tracing::debug;

/// Default timeout when neither the caller nor a shared client supplies one.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One platform API request, described declaratively.
///
/// Built by a concrete handler and executed by [`execute`](RequestSpec::execute),
/// which centralizes the shared-client-vs-ephemeral-client decision, the
/// per-request timeout override, and the harmonized 404 mapping.
pub struct RequestSpec {
    /// Request URL.
    pub url: String,
    /// Extra headers.
    pub headers: Vec<(&'static str, String)>,
    /// Query-string parameters.
    pub query: Vec<(&'static str, String)>,
    /// JSON body; presence makes this a POST.
    pub json_body: Option<Value>,
    /// Basic-auth credentials (user, password).
    pub basic_auth: Option<(String, String)>,
    /// Per-request timeout; overrides the shared client's default.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    /// A GET request for `url` with no extras.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            query: Vec::new(),
            json_body: None,
            basic_auth: None,
            timeout: None,
        }
    }

    /// A POST request for `url` carrying a JSON body.
    pub fn post_json(url: impl Into<String>, body: Value) -> Self {
        Self {
            json_body: Some(body),
            ..Self::get(url)
        }
    }

    /// Execute against the shared client, or a short-lived one when none is
    /// supplied (the test pathway).
    ///
    /// # Errors
    ///
    /// 404 → [`TicketError::PlatformNotFound`]; any other error status →
    /// [`TicketError::PlatformApi`]; transport failures →
    /// [`TicketError::Http`]; a non-JSON success body →
    /// [`TicketError::PlatformApi`].
    pub async fn execute(
        self,
        client: Option<&reqwest::Client>,
        platform_name: &str,
        ticket_id: &str,
    ) -> Result<Value> {
        let ephemeral;
        let client = match client {
            Some(shared) => shared,
            None => {
                ephemeral = reqwest::Client::builder()
                    .timeout(self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
                    .build()
                    .map_err(|e| TicketError::Http(e.to_string()))?;
                &ephemeral
            }
        };

        let mut request = match &self.json_body {
            Some(body) => client.post(&self.url).json(body),
            None => client.get(&self.url),
        };
        for (name, value) in &self.headers {
            request = request.header(*name, value);
        }
        if !self.query.is_empty() {
            request = request.query(&self.query);
        }
        if let Some((user, password)) = &self.basic_auth {
            request = request.basic_auth(user, Some(password));
        }
        // Applied even with a pooled client so individual operations keep
        // their own deadlines.
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        debug!(platform = platform_name, url = %self.url, "platform API request");
        let response = request
            .send()
            .await
            .map_err(|e| TicketError::Http(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TicketError::PlatformNotFound {
                platform: platform_name.to_string(),
                ticket_id: ticket_id.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(TicketError::PlatformApi {
                platform: platform_name.to_string(),
                ticket_id: ticket_id.to_string(),
                details: format!("HTTP {}: {snippet}", status.as_u16()),
            });
        }

        response.json::<Value>().await.map_err(|e| TicketError::PlatformApi {
            platform: platform_name.to_string(),
            ticket_id: ticket_id.to_string(),
            details: format!("invalid JSON response: {e}"),
        })
    }
}

/// Per-platform API handler.
///
/// One handler instance serves concurrent callers; any state is
/// read-only after construction.
#[async_trait]
pub trait PlatformHandler: Send + Sync {
    /// Human-readable platform name used in error messages.
    fn platform_name(&self) -> &'static str;

    /// Canonical credential keys this handler requires.
    fn required_credential_keys(&self) -> &'static [&'static str];

    /// Execute the platform request and return the raw decoded payload.
    async fn fetch(
        &self,
        ticket_id: &str,
        credentials: &BTreeMap<String, String>,
        timeout: Option<Duration>,
        client: Option<&reqwest::Client>,
    ) -> Result<Value>;

    /// Validate that every required credential key is present.
    ///
    /// # Errors
    ///
    /// [`TicketError::CredentialValidation`] listing the sorted missing keys.
    fn validate_credentials(&self, credentials: &BTreeMap<String, String>) -> Result<()> {
        let mut missing: Vec<String> = self
            .required_credential_keys()
            .iter()
            .filter(|key| !credentials.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(TicketError::CredentialValidation {
            platform: self.platform_name().to_string(),
            missing,
        })
    }
}

/// Shared GraphQL request/response handling.
///
/// Layers three checks over the transport: an `errors` array after HTTP
/// success, a null `data` object, and per-platform entity extraction where
/// a missing entity means not-found.
pub struct GraphQlRequest {
    /// The request to execute.
    pub spec: RequestSpec,
}

impl GraphQlRequest {
    /// Execute and validate, extracting the entity with `extract_entity`.
    ///
    /// `extract_entity` receives the non-null `data` object and returns the
    /// platform entity, or `None` when the entity is absent (→ not-found).
    pub async fn execute(
        self,
        client: Option<&reqwest::Client>,
        platform_name: &str,
        ticket_id: &str,
        extract_entity: impl FnOnce(&Value) -> Option<Value>,
    ) -> Result<Value> {
        let response = self.spec.execute(client, platform_name, ticket_id).await?;

        if let Some(errors) = response.get("errors") {
            return Err(TicketError::PlatformApi {
                platform: platform_name.to_string(),
                ticket_id: ticket_id.to_string(),
                details: format!("GraphQL errors: {errors}"),
            });
        }

        let data = match response.get("data") {
            Some(Value::Null) | None => {
                return Err(TicketError::PlatformApi {
                    platform: platform_name.to_string(),
                    ticket_id: ticket_id.to_string(),
                    details: "GraphQL response contains null data".to_string(),
                });
            }
            Some(data) => data,
        };

        extract_entity(data).ok_or_else(|| TicketError::PlatformNotFound {
            platform: platform_name.to_string(),
            ticket_id: ticket_id.to_string(),
        })
    }
}
