// SPDX-License-Identifier: MIT OR Apache-2.0
//! Cache keys and entries.

use chrono::{DateTime, Utc};
use ingot_core::{GenericTicket, Platform, parse_timestamp};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;
use std::time::Duration;

/// Percent-encode everything outside `[A-Za-z0-9_.~-]`.
///
/// Ticket ids carry colons, slashes, and `#`; encoding them keeps the
/// string form of a key unambiguous (the `PLATFORM:` prefix stays the only
/// colon).
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Unique cache key: `(platform, ticket_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Source platform.
    pub platform: Platform,
    /// Canonical ticket id as produced by the provider's parser.
    pub ticket_id: String,
}

impl CacheKey {
    /// Key for an explicit platform/id pair.
    pub fn new(platform: Platform, ticket_id: impl Into<String>) -> Self {
        Self {
            platform,
            ticket_id: ticket_id.into(),
        }
    }

    /// Key derived from a ticket's own identity.
    pub fn from_ticket(ticket: &GenericTicket) -> Self {
        Self::new(ticket.platform, ticket.id.clone())
    }

    /// Canonical string form: `PLATFORMNAME:<percent-encoded id>`.
    pub fn storage_key(&self) -> String {
        let encoded = utf8_percent_encode(&self.ticket_id, QUOTE_SET);
        format!("{}:{encoded}", self.platform.as_str())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// A cached ticket with expiration metadata. All timestamps are UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTicket {
    /// The cached ticket.
    pub ticket: GenericTicket,
    /// When the entry was written.
    pub cached_at: DateTime<Utc>,
    /// When the entry stops being servable.
    pub expires_at: DateTime<Utc>,
    /// Opaque validator tag for future conditional requests.
    pub etag: Option<String>,
}

impl CachedTicket {
    /// Build an entry expiring `ttl` from now.
    pub fn new(ticket: GenericTicket, ttl: Duration, etag: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            ticket,
            cached_at: now,
            expires_at: now
                + chrono::Duration::from_std(ttl)
                    .unwrap_or_else(|_| chrono::Duration::days(365 * 100)),
            etag,
        }
    }

    /// Whether the entry has expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Remaining time-to-live; zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        (self.expires_at - Utc::now()).to_std().unwrap_or(Duration::ZERO)
    }

    /// Serialize to the on-disk JSON envelope.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "ticket": self.ticket.to_value(),
            "cached_at": self.cached_at.to_rfc3339(),
            "expires_at": self.expires_at.to_rfc3339(),
            "etag": self.etag,
        })
    }

    /// Deserialize from the on-disk JSON envelope; `None` for any malformed
    /// part (the caller discards the file).
    pub fn from_value(value: &Value) -> Option<CachedTicket> {
        let ticket = GenericTicket::from_value(value.get("ticket")?).ok()?;
        let cached_at = parse_timestamp(value.get("cached_at")?.as_str()?)?;
        let expires_at = parse_timestamp(value.get("expires_at")?.as_str()?)?;
        let etag = value
            .get("etag")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(CachedTicket {
            ticket,
            cached_at,
            expires_at,
            etag,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn storage_key_encodes_special_characters() {
        let key = CacheKey::new(Platform::Github, "owner/repo#42");
        assert_eq!(key.storage_key(), "GITHUB:owner%2Frepo%2342");
        let key = CacheKey::new(Platform::Monday, "123:456");
        assert_eq!(key.storage_key(), "MONDAY:123%3A456");
    }

    #[test]
    fn storage_key_leaves_plain_ids_readable() {
        let key = CacheKey::new(Platform::Jira, "PROJ-123");
        assert_eq!(key.storage_key(), "JIRA:PROJ-123");
    }

    #[test]
    fn from_ticket_uses_ticket_identity() {
        let ticket = GenericTicket::new("ENG-1", Platform::Linear);
        let key = CacheKey::from_ticket(&ticket);
        assert_eq!(key.platform, Platform::Linear);
        assert_eq!(key.ticket_id, "ENG-1");
    }

    #[test]
    fn entry_expiry() {
        let ticket = GenericTicket::new("X-1", Platform::Jira);
        let fresh = CachedTicket::new(ticket.clone(), Duration::from_secs(3600), None);
        assert!(!fresh.is_expired());
        assert!(fresh.ttl_remaining() > Duration::from_secs(3590));

        let expired = CachedTicket::new(ticket, Duration::ZERO, None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(expired.is_expired());
        assert_eq!(expired.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn envelope_roundtrip() {
        let mut ticket = GenericTicket::new("PROJ-1", Platform::Jira);
        ticket.title = "t".into();
        let entry = CachedTicket::new(ticket, Duration::from_secs(60), Some("v1".into()));
        let back = CachedTicket::from_value(&entry.to_value()).unwrap();
        assert_eq!(back.ticket, entry.ticket);
        assert_eq!(back.etag.as_deref(), Some("v1"));
        // RFC 3339 round trip is second-precision-stable at worst.
        assert_eq!(back.cached_at.timestamp(), entry.cached_at.timestamp());
    }

    #[test]
    fn malformed_envelope_is_none() {
        assert!(CachedTicket::from_value(&serde_json::json!({})).is_none());
        assert!(CachedTicket::from_value(&serde_json::json!({"ticket": {}})).is_none());
        let missing_times = serde_json::json!({
            "ticket": {"id": "X-1", "platform": "JIRA"},
        });
        assert!(CachedTicket::from_value(&missing_times).is_none());
    }

    proptest! {
        #[test]
        fn storage_key_has_exactly_one_unencoded_colon(id in ".*") {
            let key = CacheKey::new(Platform::Trello, id);
            let s = key.storage_key();
            prop_assert_eq!(s.matches(':').count(), 1);
            prop_assert!(s.starts_with("TRELLO:"));
        }
    }
}
