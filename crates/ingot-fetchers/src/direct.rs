// SPDX-License-Identifier: MIT OR Apache-2.0
//! Direct platform-API ticket fetching.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ingot_core::{AuthManager, Platform, required_credential_keys};
use ingot_error::{Result, TicketError};
use ingot_handlers::HandlerRegistry;
use serde_json::Value;
use tracing::debug;

use crate::fetcher::TicketFetcher;

/// Fetches tickets straight from platform APIs using fallback credentials.
///
/// Owns a handler registry and one shared HTTP client; the client pools
/// connections across handler invocations, with per-request timeouts passed
/// per call rather than by mutating the client.
pub struct DirectApiFetcher {
    handlers: HandlerRegistry,
    auth: Arc<dyn AuthManager>,
    client: reqwest::Client,
}

impl DirectApiFetcher {
    /// Fetcher with the default handler set.
    pub fn new(auth: Arc<dyn AuthManager>) -> Self {
        Self::with_handlers(auth, HandlerRegistry::with_default_handlers())
    }

    /// Fetcher with a custom handler registry (tests, partial deployments).
    pub fn with_handlers(auth: Arc<dyn AuthManager>, handlers: HandlerRegistry) -> Self {
        Self {
            handlers,
            auth,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TicketFetcher for DirectApiFetcher {
    fn name(&self) -> &str {
        "Direct API Fetcher"
    }

    fn supports_platform(&self, platform: Platform) -> bool {
        self.handlers.supports(platform)
    }

    async fn fetch_raw(
        &self,
        ticket_id: &str,
        platform: Platform,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let Some(handler) = self.handlers.get(platform) else {
            return Err(TicketError::PlatformNotSupported {
                platform: platform.as_str().to_string(),
                fetcher: self.name().to_string(),
            });
        };

        let creds = self.auth.get_credentials(platform);
        if !creds.is_configured {
            // Report every required key as missing; the error message from
            // the auth manager is already user-facing.
            return Err(TicketError::CredentialValidation {
                platform: handler.platform_name().to_string(),
                missing: required_credential_keys(platform)
                    .iter()
                    .map(|k| k.to_string())
                    .collect(),
            });
        }

        debug!(platform = %platform, ticket_id, "direct API fetch");
        handler
            .fetch(ticket_id, &creds.credentials, timeout, Some(&self.client))
            .await
    }

    async fn close(&self) {
        // The pooled client tears its connections down on drop; nothing to
        // release eagerly. Kept for contract symmetry with mediated
        // fetchers.
        debug!("direct API fetcher closed");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
