// SPDX-License-Identifier: MIT OR Apache-2.0
//! TTL-expiring ticket caches.
//!
//! Memoizes normalized tickets for the current session, keyed by
//! `(platform, ticket_id)`. Two variants share one interface: an in-memory
//! LRU ([`MemoryTicketCache`]) and a file-backed store
//! ([`FileTicketCache`]) with atomic writes and lazy probabilistic LRU
//! eviction.
//!
//! Isolation property: a ticket stored then retrieved compares equal to
//! the stored value regardless of what any caller does to either copy
//! afterwards — the cache stores and hands out owned values, never shared
//! references.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod file;
mod global;
mod key;
mod memory;

pub use cache::{CacheStats, TicketCache};
pub use file::FileTicketCache;
pub use global::{
    GlobalCacheKind, GlobalCacheParams, clear_testing_global_cache, swap_testing_global_cache,
    testing_global_cache,
};
pub use key::{CacheKey, CachedTicket};
pub use memory::MemoryTicketCache;

/// Default entry time-to-live: one hour.
pub const DEFAULT_TTL: std::time::Duration = std::time::Duration::from_secs(3600);
