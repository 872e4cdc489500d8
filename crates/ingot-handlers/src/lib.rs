// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-platform API handlers.
//!
//! A handler executes exactly one HTTP or GraphQL request for a ticket on
//! one platform and returns the raw decoded payload. Handlers never
//! normalize data and are consumed only by the direct-API fetcher.
//!
//! Error semantics are harmonized across transports: an HTTP 404 and a
//! GraphQL "entity missing" both surface as the same not-found error, so
//! the service layer needs a single branch for "ticket does not exist".

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod azure_devops;
mod github;
mod handler;
mod jira;
mod linear;
mod monday;
mod registry;
mod trello;

pub use azure_devops::AzureDevopsHandler;
pub use github::GithubHandler;
pub use handler::{GraphQlRequest, PlatformHandler, RequestSpec};
pub use jira::JiraHandler;
pub use linear::LinearHandler;
pub use monday::MondayHandler;
pub use registry::HandlerRegistry;
pub use trello::TrelloHandler;
