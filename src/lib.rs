// SPDX-License-Identifier: MIT OR Apache-2.0
//! Facade over the ticket acquisition workspace.
//!
//! Re-exports the public surface of the member crates so downstream code
//! (the workflow engine, the CLI) can depend on one crate. The interesting
//! code lives in `crates/ingot-*`; the root `tests/` directory hosts the
//! cross-crate end-to-end suite.

#![deny(unsafe_code)]

pub use ingot_backend::{
    API_SUPPORT, BackendKind, CodingBackend, FetchMechanism, RunOptions, platform_support,
};
pub use ingot_cache::{
    CacheKey, CachedTicket, DEFAULT_TTL, FileTicketCache, MemoryTicketCache, TicketCache,
};
pub use ingot_core::{
    AuthManager, GenericTicket, Platform, PlatformCredentials, RateLimitConfig, StaticAuthManager,
    TicketStatus, TicketType, non_serializable_marker,
};
pub use ingot_detect::{MatchKind, detect};
pub use ingot_error::{BackendError, ErrorCategory, Result, TicketError};
pub use ingot_fetchers::{AgentMediatedFetcher, DirectApiFetcher, TicketFetcher};
pub use ingot_handlers::{HandlerRegistry, PlatformHandler};
pub use ingot_providers::{
    ProviderConfig, ProviderDeps, ProviderRegistry, TicketProvider, UserInteraction,
};
pub use ingot_service::{GetTicketOptions, ServiceBuilder, TicketService, run_scoped};
