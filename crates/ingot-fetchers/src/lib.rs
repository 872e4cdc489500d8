// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ticket fetch strategies.
//!
//! A fetcher retrieves *raw* platform data for a ticket id; normalization
//! to the common shape stays with the providers. Two families exist:
//!
//! - **Agent-mediated** ([`AgentMediatedFetcher`]): a prompt is dispatched
//!   through an AI backend whose tool integrations reach the platform; the
//!   free-form text reply is mined for a JSON object.
//! - **Direct API** ([`DirectApiFetcher`]): the platform's REST or GraphQL
//!   API is called through the handler layer with fallback credentials.
//!
//! The service layer composes the two as primary + fallback.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod agent;
mod direct;
mod extract;
mod fetcher;
pub mod templates;

pub use agent::{AgentMediatedFetcher, DEFAULT_AGENT_TIMEOUT};
pub use direct::DirectApiFetcher;
pub use extract::extract_json_object;
pub use fetcher::TicketFetcher;
