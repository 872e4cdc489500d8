// SPDX-License-Identifier: MIT OR Apache-2.0
//! The fetch-strategy contract.

use std::time::Duration;

use async_trait::async_trait;
use ingot_core::Platform;
use ingot_error::Result;
use serde_json::Value;

/// A ticket fetch strategy.
///
/// Implementations return raw platform payloads; they never normalize.
#[async_trait]
pub trait TicketFetcher: Send + Sync {
    /// Human-readable fetcher name, e.g. `"Claude MCP Fetcher"`.
    fn name(&self) -> &str;

    /// Whether this fetcher can fetch tickets from `platform`.
    fn supports_platform(&self, platform: Platform) -> bool;

    /// Fetch raw ticket data.
    ///
    /// `timeout` overrides the fetcher's default for this request only.
    ///
    /// # Errors
    ///
    /// `PlatformNotSupported` when the platform is outside this fetcher's
    /// set; otherwise the strategy-specific errors documented on the
    /// implementation.
    async fn fetch_raw(
        &self,
        ticket_id: &str,
        platform: Platform,
        timeout: Option<Duration>,
    ) -> Result<Value>;

    /// Release any resources held by the fetcher. Idempotent.
    async fn close(&self) {}
}
