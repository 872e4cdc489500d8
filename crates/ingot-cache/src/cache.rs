// SPDX-License-Identifier: MIT OR Apache-2.0
//! The cache interface.

use std::collections::BTreeMap;
use std::time::Duration;

use ingot_core::{GenericTicket, Platform};

use crate::key::{CacheKey, CachedTicket};

/// Per-platform entry counts.
pub type CacheStats = BTreeMap<String, usize>;

/// TTL-expiring key → ticket store.
///
/// Implementations are safe for concurrent callers; every method is atomic
/// per key.
pub trait TicketCache: Send + Sync {
    /// Retrieve the cached ticket if present and not expired.
    fn get(&self, key: &CacheKey) -> Option<GenericTicket> {
        self.get_entry(key).map(|entry| entry.ticket)
    }

    /// Retrieve the full entry with expiration metadata.
    fn get_entry(&self, key: &CacheKey) -> Option<CachedTicket>;

    /// Store a ticket, keyed by its own identity.
    ///
    /// `ttl` falls back to the cache default; `etag` is an opaque validator
    /// tag for future conditional requests. Storage failures are logged and
    /// swallowed — caching is opportunistic and never aborts a session.
    fn set(&self, ticket: &GenericTicket, ttl: Option<Duration>, etag: Option<String>);

    /// Remove one entry.
    fn invalidate(&self, key: &CacheKey);

    /// Remove every entry.
    fn clear(&self);

    /// Remove every entry for one platform.
    fn clear_platform(&self, platform: Platform);

    /// Validator tag for a live entry, if any.
    fn get_etag(&self, key: &CacheKey) -> Option<String> {
        self.get_entry(key).and_then(|entry| entry.etag)
    }

    /// Current number of entries (including any not-yet-evicted expired
    /// ones, for the file variant).
    fn size(&self) -> usize;

    /// Entry counts per platform name.
    fn stats(&self) -> CacheStats;
}
