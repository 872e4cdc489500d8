// SPDX-License-Identifier: MIT OR Apache-2.0
//! The provider contract and its injected dependencies.

use std::sync::Arc;

use ingot_core::{GenericTicket, Platform};
use ingot_error::Result;
use serde_json::Value;

use crate::interaction::{SilentInteraction, UserInteraction};

/// Configured defaults injected into providers at construction.
///
/// All fields are optional; a provider that needs one and does not have it
/// simply narrows what inputs it accepts (e.g. Jira refuses bare numeric
/// ids without a default project). The configuration loader populates this
/// from user settings before registry construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Default Jira project key for bare numeric ids (`123` → `PROJ-123`).
    pub default_jira_project: Option<String>,
    /// Base URL used to reconstruct Jira browse URLs when the payload has
    /// no usable `self` link.
    pub jira_base_url: Option<String>,
    /// Default owner for bare GitHub issue references (`#123`).
    pub default_github_owner: Option<String>,
    /// Default repository for bare GitHub issue references (`#123`).
    pub default_github_repo: Option<String>,
    /// Explicitly allowed GitHub Enterprise host (e.g.
    /// `github.mycompany.com`). URLs outside `github.com` are rejected
    /// unless they match this host.
    pub github_enterprise_host: Option<String>,
    /// Default Azure DevOps organization for `AB#123` references.
    pub azure_default_org: Option<String>,
    /// Default Azure DevOps project for `AB#123` references.
    pub azure_default_project: Option<String>,
}

/// Dependency bundle handed to provider factories.
///
/// A factory receives the whole bundle and picks what it needs, keeping
/// injection explicit and statically typed.
#[derive(Clone)]
pub struct ProviderDeps {
    /// Interactive capability; silent by default.
    pub user_interaction: Arc<dyn UserInteraction>,
    /// Configured provider defaults.
    pub config: ProviderConfig,
}

impl Default for ProviderDeps {
    fn default() -> Self {
        Self {
            user_interaction: Arc::new(SilentInteraction),
            config: ProviderConfig::default(),
        }
    }
}

impl std::fmt::Debug for ProviderDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderDeps")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Per-platform ticket provider: recognize, parse, normalize.
///
/// Implementations are stateless after construction and never perform I/O.
/// `normalize` must tolerate malformed payloads — nested fields that are
/// null, scalar, or of an unexpected type — producing a best-effort ticket,
/// and must fail (rather than return a ghost ticket) only when the primary
/// identifier itself is missing or blank.
pub trait TicketProvider: Send + Sync {
    /// The platform this provider handles.
    fn platform(&self) -> Platform;

    /// Human-readable provider name, e.g. `"GitHub Issues"`.
    fn name(&self) -> &'static str;

    /// Whether this provider recognizes the input format.
    fn can_handle(&self, input: &str) -> bool;

    /// Parse an input string to the canonical ticket id.
    fn parse_input(&self, input: &str) -> Result<String>;

    /// Convert a raw platform payload to a [`GenericTicket`].
    ///
    /// `ticket_id` is the id from [`TicketProvider::parse_input`]; providers
    /// that embed request context in the id (Monday's account slug) read it
    /// from here, everyone else ignores it.
    fn normalize(&self, raw: &Value, ticket_id: Option<&str>) -> Result<GenericTicket>;

    /// Structured prompt template for agent-mediated fetch, with a single
    /// `{ticket_id}` slot. Empty for platforms without mediated support.
    fn prompt_template(&self) -> &'static str {
        ""
    }
}
