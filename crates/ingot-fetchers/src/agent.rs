// SPDX-License-Identifier: MIT OR Apache-2.0
//! Agent-mediated ticket fetching through an AI backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ingot_backend::{CodingBackend, RunOptions};
use ingot_core::Platform;
use ingot_error::{BackendError, Result, TicketError};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::extract::extract_json_object;
use crate::fetcher::TicketFetcher;
use crate::templates;

/// Default timeout for a mediated fetch.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Safety margin added to the cooperative outer deadline.
const OUTER_TIMEOUT_BUFFER: Duration = Duration::from_secs(10);

/// Longest raw-reply preview attached to parse errors.
const RAW_PREVIEW_LIMIT: usize = 500;

/// Fetches tickets by prompting an AI backend whose tool integrations
/// reach the platform.
///
/// One struct serves all three mediated backends; variants differ only in
/// display name and in whether the per-call timeout is passed down to the
/// backend subprocess. Auggie enforces the deadline with the outer
/// cooperative timeout alone; Claude and Cursor also receive the timeout
/// per call.
pub struct AgentMediatedFetcher {
    backend: Arc<dyn CodingBackend>,
    name: &'static str,
    pass_timeout_to_backend: bool,
    default_timeout: Duration,
}

impl AgentMediatedFetcher {
    /// Fetcher driving the Auggie CLI (outer timeout only).
    pub fn auggie(backend: Arc<dyn CodingBackend>) -> Self {
        Self {
            backend,
            name: "Auggie MCP Fetcher",
            pass_timeout_to_backend: false,
            default_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Fetcher driving the Claude Code CLI.
    pub fn claude(backend: Arc<dyn CodingBackend>) -> Self {
        Self {
            backend,
            name: "Claude MCP Fetcher",
            pass_timeout_to_backend: true,
            default_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Fetcher driving the Cursor CLI.
    pub fn cursor(backend: Arc<dyn CodingBackend>) -> Self {
        Self {
            backend,
            name: "Cursor MCP Fetcher",
            pass_timeout_to_backend: true,
            default_timeout: DEFAULT_AGENT_TIMEOUT,
        }
    }

    /// Override the default per-fetch timeout.
    pub fn with_default_timeout(mut self, default_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self
    }

    fn agent_fetch_error(&self, message: impl Into<String>) -> TicketError {
        TicketError::AgentFetch {
            agent: self.name.to_string(),
            message: message.into(),
        }
    }

    /// Run the prompt under the cooperative deadline.
    ///
    /// The subprocess-level timeout (when passed through) is the real
    /// enforcement; the outer `tokio::time::timeout` is a safety net with a
    /// generous buffer in case something else blocks.
    async fn execute_prompt(&self, prompt: &str, effective_timeout: Duration) -> Result<String> {
        debug!(
            fetcher = self.name,
            timeout_secs = effective_timeout.as_secs(),
            "executing backend fetch"
        );

        let options = RunOptions {
            dont_save_session: true,
            timeout: self.pass_timeout_to_backend.then_some(effective_timeout),
        };

        let outcome = timeout(
            effective_timeout + OUTER_TIMEOUT_BUFFER,
            self.backend.run_print_quiet(prompt, options),
        )
        .await;

        let reply = match outcome {
            Err(_) | Ok(Err(BackendError::Timeout { .. })) => {
                return Err(self.agent_fetch_error(format!(
                    "Backend execution timed out after {}s",
                    effective_timeout.as_secs()
                )));
            }
            Ok(Err(err)) => {
                return Err(self.agent_fetch_error(format!("Backend invocation failed: {err}")));
            }
            Ok(Ok(reply)) => reply,
        };

        if reply.is_empty() {
            return Err(self.agent_fetch_error("Backend returned empty response"));
        }
        Ok(reply)
    }

    fn parse_response(&self, response: &str, platform: Platform) -> Result<Value> {
        let data = extract_json_object(response).ok_or_else(|| {
            let preview: String = response.chars().take(RAW_PREVIEW_LIMIT).collect();
            TicketError::AgentResponseParse {
                agent: self.name.to_string(),
                message: "Failed to parse JSON from agent response: no valid JSON object found"
                    .into(),
                raw_preview: preview,
            }
        })?;
        self.validate_response(data, platform)
    }

    fn validate_response(&self, data: Value, platform: Platform) -> Result<Value> {
        let object = data.as_object().expect("extractor only returns objects");
        let mut missing: Vec<&str> = templates::required_fields(platform)
            .iter()
            .copied()
            .filter(|field| !object.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            missing.sort_unstable();
            return Err(TicketError::AgentResponseParse {
                agent: self.name.to_string(),
                message: format!(
                    "Response missing required fields for {}: {}",
                    platform.as_str(),
                    missing.join(", ")
                ),
                raw_preview: data.to_string().chars().take(RAW_PREVIEW_LIMIT).collect(),
            });
        }
        Ok(data)
    }
}

#[async_trait]
impl TicketFetcher for AgentMediatedFetcher {
    fn name(&self) -> &str {
        self.name
    }

    fn supports_platform(&self, platform: Platform) -> bool {
        templates::supports_mediated_fetch(platform)
            && self.backend.kind().mediated_support().contains(&platform)
    }

    async fn fetch_raw(
        &self,
        ticket_id: &str,
        platform: Platform,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        if !self.supports_platform(platform) {
            return Err(TicketError::PlatformNotSupported {
                platform: platform.as_str().to_string(),
                fetcher: self.name.to_string(),
            });
        }

        let prompt = templates::build_prompt(platform, ticket_id).ok_or_else(|| {
            TicketError::AgentIntegration {
                agent: self.name.to_string(),
                message: format!("No prompt template for platform: {}", platform.as_str()),
            }
        })?;

        let effective_timeout = timeout.unwrap_or(self.default_timeout);
        let response = self.execute_prompt(&prompt, effective_timeout).await?;
        self.parse_response(&response, platform)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
