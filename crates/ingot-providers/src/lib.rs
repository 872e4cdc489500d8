// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-platform ticket providers.
//!
//! A provider knows how to recognize, parse, and normalize one platform's
//! ticket references and payloads. Providers are pure with respect to the
//! network — fetching belongs to the fetcher layer — and hold no
//! per-request state, so a single instance serves concurrent callers.
//!
//! The [`ProviderRegistry`] maps platform tags to lazily-created provider
//! singletons, injecting a [`ProviderDeps`] bundle (user-interaction
//! capability plus configured defaults) through each provider's factory.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod azure_devops;
mod github;
mod interaction;
mod jira;
mod linear;
mod monday;
mod provider;
mod registry;
mod trello;

pub use azure_devops::AzureDevopsProvider;
pub use github::GithubProvider;
pub use interaction::{SilentInteraction, UserInteraction};
pub use jira::JiraProvider;
pub use linear::LinearProvider;
pub use monday::MondayProvider;
pub use provider::{ProviderConfig, ProviderDeps, TicketProvider};
pub use registry::{ProviderFactory, ProviderRegistry};
pub use trello::TrelloProvider;
