// SPDX-License-Identifier: MIT OR Apache-2.0
//! Core data model for the ticket acquisition pipeline.
//!
//! Defines the platform-agnostic [`GenericTicket`] record that every
//! provider produces and everything downstream consumes, the closed
//! [`Platform`] / [`TicketStatus`] / [`TicketType`] enumerations, the
//! deterministic git-safe derivations (branch slug, filename stem), the
//! shared ISO-8601 timestamp parser, defensive [`serde_json::Value`]
//! accessors, and the credential contract consumed by the direct-API fetch
//! path.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod credentials;
pub mod ratelimit;
pub mod slug;
pub mod ticket;
pub mod value;

pub use credentials::{
    AuthManager, PlatformCredentials, StaticAuthManager, required_credential_keys,
};
pub use ratelimit::{RateLimitConfig, backoff_delay};
pub use slug::{sanitize_for_branch_component, sanitize_title_for_branch};
pub use ticket::{GenericTicket, Platform, TicketStatus, TicketType};
pub use value::{
    clean_labels, non_serializable_marker, parse_timestamp, safe_nested_get, safe_nested_value,
};
