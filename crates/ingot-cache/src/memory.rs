// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory ticket cache with LRU eviction.

use std::sync::Mutex;
use std::time::Duration;

use ingot_core::{GenericTicket, Platform};
use lru::LruCache;
use tracing::debug;

use crate::cache::{CacheStats, TicketCache};
use crate::key::{CacheKey, CachedTicket};

/// Thread-safe in-memory cache.
///
/// An access-ordered map under a single mutex: reads promote the entry,
/// inserts evict strictly-LRU once `max_size` is reached (`0` means
/// unbounded). Expired entries are evicted on touch. Entry construction
/// (the owned copy going in) happens before the lock is taken, keeping the
/// critical section to map operations.
pub struct MemoryTicketCache {
    default_ttl: Duration,
    max_size: usize,
    entries: Mutex<LruCache<String, CachedTicket>>,
}

impl MemoryTicketCache {
    /// Cache with the given default TTL and size bound (`0` = unbounded).
    pub fn new(default_ttl: Duration, max_size: usize) -> Self {
        Self {
            default_ttl,
            max_size,
            entries: Mutex::new(LruCache::unbounded()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedTicket>> {
        self.entries.lock().expect("cache lock")
    }
}

impl Default for MemoryTicketCache {
    fn default() -> Self {
        Self::new(crate::DEFAULT_TTL, 0)
    }
}

impl TicketCache for MemoryTicketCache {
    fn get_entry(&self, key: &CacheKey) -> Option<CachedTicket> {
        let storage_key = key.storage_key();
        let mut entries = self.lock();
        // `get` promotes to most-recently-used, which is the point.
        let entry = entries.get(&storage_key)?;
        if entry.is_expired() {
            entries.pop(&storage_key);
            debug!(key = %key, "cache expired");
            return None;
        }
        debug!(key = %key, "cache hit");
        Some(entry.clone())
    }

    fn set(&self, ticket: &GenericTicket, ttl: Option<Duration>, etag: Option<String>) {
        let key = CacheKey::from_ticket(ticket).storage_key();
        // Owned copy built outside the lock.
        let entry = CachedTicket::new(ticket.clone(), ttl.unwrap_or(self.default_ttl), etag);

        let mut entries = self.lock();
        entries.pop(&key);
        while self.max_size > 0 && entries.len() >= self.max_size {
            if let Some((evicted, _)) = entries.pop_lru() {
                debug!(key = %evicted, "LRU evicted");
            }
        }
        entries.put(key, entry);
    }

    fn invalidate(&self, key: &CacheKey) {
        if self.lock().pop(&key.storage_key()).is_some() {
            debug!(key = %key, "invalidated");
        }
    }

    fn clear(&self) {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();
        debug!(count, "cleared cache");
    }

    fn clear_platform(&self, platform: Platform) {
        let prefix = format!("{}:", platform.as_str());
        let mut entries = self.lock();
        let keys: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            entries.pop(key);
        }
        debug!(count = keys.len(), platform = %platform, "cleared platform entries");
    }

    fn size(&self) -> usize {
        self.lock().len()
    }

    fn stats(&self) -> CacheStats {
        let entries = self.lock();
        let mut stats = CacheStats::new();
        for (key, _) in entries.iter() {
            let platform = key.split(':').next().unwrap_or("").to_string();
            *stats.entry(platform).or_insert(0) += 1;
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ticket(id: &str, platform: Platform) -> GenericTicket {
        let mut t = GenericTicket::new(id, platform);
        t.title = format!("ticket {id}");
        t
    }

    fn key(id: &str, platform: Platform) -> CacheKey {
        CacheKey::new(platform, id)
    }

    #[test]
    fn set_then_get_roundtrips() {
        let cache = MemoryTicketCache::default();
        let t = ticket("PROJ-1", Platform::Jira);
        cache.set(&t, None, None);
        assert_eq!(cache.get(&key("PROJ-1", Platform::Jira)).unwrap(), t);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn miss_on_absent_key() {
        let cache = MemoryTicketCache::default();
        assert!(cache.get(&key("PROJ-404", Platform::Jira)).is_none());
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("PROJ-1", Platform::Jira), Some(Duration::ZERO), None);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&key("PROJ-1", Platform::Jira)).is_none());
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn isolation_mutating_either_copy_never_affects_the_other() {
        let cache = MemoryTicketCache::default();
        let mut stored = ticket("PROJ-1", Platform::Jira);
        cache.set(&stored, None, None);

        // Mutate the caller's copy after storing.
        stored.title = "mutated by caller".into();
        stored.platform_metadata.insert("k".into(), json!("v"));

        let mut retrieved = cache.get(&key("PROJ-1", Platform::Jira)).unwrap();
        assert_eq!(retrieved.title, "ticket PROJ-1");
        assert!(!retrieved.platform_metadata.contains_key("k"));

        // Mutate the retrieved copy; the cache is unaffected.
        retrieved.title = "mutated after read".into();
        let again = cache.get(&key("PROJ-1", Platform::Jira)).unwrap();
        assert_eq!(again.title, "ticket PROJ-1");
    }

    #[test]
    fn lru_eviction_at_max_size() {
        let cache = MemoryTicketCache::new(crate::DEFAULT_TTL, 2);
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        cache.set(&ticket("A-2", Platform::Jira), None, None);
        // Touch A-1 so A-2 becomes least recently used.
        cache.get(&key("A-1", Platform::Jira));
        cache.set(&ticket("A-3", Platform::Jira), None, None);

        assert_eq!(cache.size(), 2);
        assert!(cache.get(&key("A-1", Platform::Jira)).is_some());
        assert!(cache.get(&key("A-2", Platform::Jira)).is_none());
        assert!(cache.get(&key("A-3", Platform::Jira)).is_some());
    }

    #[test]
    fn reinserting_same_key_does_not_evict_others() {
        let cache = MemoryTicketCache::new(crate::DEFAULT_TTL, 2);
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        cache.set(&ticket("A-2", Platform::Jira), None, None);
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        assert_eq!(cache.size(), 2);
        assert!(cache.get(&key("A-2", Platform::Jira)).is_some());
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        cache.set(&ticket("ENG-1", Platform::Linear), None, None);

        cache.invalidate(&key("A-1", Platform::Jira));
        assert!(cache.get(&key("A-1", Platform::Jira)).is_none());
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn clear_platform_is_selective() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        cache.set(&ticket("A-2", Platform::Jira), None, None);
        cache.set(&ticket("ENG-1", Platform::Linear), None, None);

        cache.clear_platform(Platform::Jira);
        assert_eq!(cache.size(), 1);
        assert!(cache.get(&key("ENG-1", Platform::Linear)).is_some());
    }

    #[test]
    fn stats_group_by_platform() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("A-1", Platform::Jira), None, None);
        cache.set(&ticket("A-2", Platform::Jira), None, None);
        cache.set(&ticket("ENG-1", Platform::Linear), None, None);

        let stats = cache.stats();
        assert_eq!(stats["JIRA"], 2);
        assert_eq!(stats["LINEAR"], 1);
    }

    #[test]
    fn etag_stored_and_retrievable() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("A-1", Platform::Jira), None, Some("v2".into()));
        assert_eq!(
            cache.get_etag(&key("A-1", Platform::Jira)).as_deref(),
            Some("v2")
        );
        assert!(cache.get_etag(&key("A-2", Platform::Jira)).is_none());
    }

    #[test]
    fn entry_metadata_exposed_via_get_entry() {
        let cache = MemoryTicketCache::default();
        cache.set(&ticket("A-1", Platform::Jira), Some(Duration::from_secs(120)), None);
        let entry = cache.get_entry(&key("A-1", Platform::Jira)).unwrap();
        assert!(entry.ttl_remaining() <= Duration::from_secs(120));
        assert!(entry.ttl_remaining() > Duration::from_secs(110));
        assert!(entry.cached_at <= entry.expires_at);
    }

    #[test]
    fn concurrent_readers_and_writers() {
        use std::sync::Arc;
        let cache = Arc::new(MemoryTicketCache::new(crate::DEFAULT_TTL, 64));
        let mut handles = Vec::new();
        for worker in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let id = format!("T-{}", (worker * 50 + i) % 80);
                    cache.set(&ticket(&id, Platform::Jira), None, None);
                    cache.get(&key(&id, Platform::Jira));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.size() <= 64);
    }
}
