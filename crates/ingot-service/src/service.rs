// SPDX-License-Identifier: MIT OR Apache-2.0
//! The orchestrator.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ingot_cache::{CacheKey, TicketCache};
use ingot_core::{GenericTicket, Platform};
use ingot_error::{Result, TicketError};
use ingot_fetchers::TicketFetcher;
use ingot_providers::ProviderRegistry;
use serde_json::Value;
use tracing::{debug, warn};

/// Per-request options for [`TicketService::get_ticket`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetTicketOptions {
    /// Bypass the cache read (the result is still written back).
    pub skip_cache: bool,
    /// Override the service's default TTL for this request's cache write.
    pub ttl: Option<Duration>,
}

/// One-stop entry point for ticket acquisition.
///
/// Owns a primary fetcher, optionally a fallback fetcher, and optionally a
/// cache. Multiple `get_ticket` calls may be in flight concurrently on one
/// instance; the registry and cache are built for parallel callers.
pub struct TicketService {
    registry: Arc<ProviderRegistry>,
    primary: Arc<dyn TicketFetcher>,
    fallback: Option<Arc<dyn TicketFetcher>>,
    cache: Option<Arc<dyn TicketCache>>,
    default_ttl: Duration,
    closed: AtomicBool,
}

impl TicketService {
    /// Assemble a service from parts. Most callers go through
    /// [`crate::ServiceBuilder`] instead.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        primary: Arc<dyn TicketFetcher>,
        fallback: Option<Arc<dyn TicketFetcher>>,
        cache: Option<Arc<dyn TicketCache>>,
        default_ttl: Duration,
    ) -> Self {
        Self {
            registry,
            primary,
            fallback,
            cache,
            default_ttl,
            closed: AtomicBool::new(false),
        }
    }

    /// Name of the primary fetcher.
    pub fn primary_fetcher_name(&self) -> String {
        self.primary.name().to_string()
    }

    /// Name of the fallback fetcher, if one is configured.
    pub fn fallback_fetcher_name(&self) -> Option<String> {
        self.fallback.as_ref().map(|f| f.name().to_string())
    }

    /// Whether a cache is attached.
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }

    /// The service's default cache TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Acquire a normalized ticket for a free-form reference.
    ///
    /// Flow: provider lookup → canonical id → cache read → primary fetch
    /// (falling back only on fallback-eligible errors) → normalize → cache
    /// write. Within one call the steps are strictly sequential; across
    /// calls no ordering is promised.
    ///
    /// # Errors
    ///
    /// Everything in the error taxonomy: unsupported input/platform, id
    /// format, credential validation, not-found, platform API, agent
    /// failures (after fallback exhaustion), and a service error once
    /// closed.
    pub async fn get_ticket(
        &self,
        input: &str,
        options: GetTicketOptions,
    ) -> Result<GenericTicket> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TicketError::Service(
                "ticket service has been closed".into(),
            ));
        }

        let provider = self.registry.get_provider_for_input(input)?;
        let platform = provider.platform();
        let ticket_id = provider.parse_input(input)?;
        let cache_key = CacheKey::new(platform, ticket_id.clone());

        if !options.skip_cache
            && let Some(cache) = &self.cache
            && let Some(ticket) = cache.get(&cache_key)
        {
            debug!(key = %cache_key, "serving ticket from cache");
            return Ok(ticket);
        }

        let raw = self.fetch_with_fallback(&ticket_id, platform).await?;
        let ticket = provider.normalize(&raw, Some(&ticket_id))?;

        if let Some(cache) = &self.cache {
            cache.set(&ticket, Some(options.ttl.unwrap_or(self.default_ttl)), None);
        }

        Ok(ticket)
    }

    /// Select a fetcher and run the fetch, falling back when allowed.
    ///
    /// Fallback fires iff the primary raised a fallback-eligible error AND
    /// a fallback is configured AND it supports the platform. Anything else
    /// propagates unchanged.
    async fn fetch_with_fallback(&self, ticket_id: &str, platform: Platform) -> Result<Value> {
        let fallback = self
            .fallback
            .as_ref()
            .filter(|f| f.supports_platform(platform));

        if self.primary.supports_platform(platform) {
            match self.primary.fetch_raw(ticket_id, platform, None).await {
                Ok(raw) => return Ok(raw),
                Err(err) if err.is_fallback_eligible() && fallback.is_some() => {
                    warn!(
                        primary = self.primary.name(),
                        error = %err,
                        "primary fetch failed, trying fallback"
                    );
                }
                Err(err) => return Err(err),
            }
        } else if fallback.is_none() {
            return Err(TicketError::PlatformNotSupported {
                platform: platform.as_str().to_string(),
                fetcher: self.primary.name().to_string(),
            });
        }

        let fallback = fallback.expect("fallback presence checked above");
        fallback.fetch_raw(ticket_id, platform, None).await
    }

    /// Remove one ticket from the cache. No-op without a cache.
    pub fn invalidate_cache(&self, platform: Platform, ticket_id: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&CacheKey::new(platform, ticket_id));
        }
    }

    /// Clear the cache, optionally for a single platform. No-op without a
    /// cache.
    pub fn clear_cache(&self, platform: Option<Platform>) {
        if let Some(cache) = &self.cache {
            match platform {
                Some(platform) => cache.clear_platform(platform),
                None => cache.clear(),
            }
        }
    }

    /// Release fetcher resources. Idempotent; later `get_ticket` calls
    /// fail with a service error.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(fallback) = &self.fallback {
            fallback.close().await;
        }
        self.primary.close().await;
        debug!("ticket service closed");
    }
}

impl Drop for TicketService {
    fn drop(&mut self) {
        // Dropping the fetchers releases their resources (pooled HTTP
        // connections close on drop); the flag only keeps any surviving
        // handles honest.
        self.closed.store(true, Ordering::Release);
    }
}

/// Run `f` against the service and close it on the way out.
///
/// The close runs on success and on error. On cancellation the future is
/// dropped wholesale, which drops the service and releases its resources
/// through RAII — the explicit close is for the orderly paths.
pub async fn run_scoped<T, F, Fut>(service: TicketService, f: F) -> Result<T>
where
    F: FnOnce(Arc<TicketService>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let service = Arc::new(service);
    let result = f(Arc::clone(&service)).await;
    service.close().await;
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ingot_cache::MemoryTicketCache;
    use ingot_providers::ProviderDeps;
    use serde_json::json;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    /// Fetcher scripted with a reply or an error factory per call.
    struct StubFetcher {
        name: &'static str,
        supported: Vec<Platform>,
        reply: std::result::Result<Value, fn() -> TicketError>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn returning(name: &'static str, reply: Value) -> Arc<Self> {
            Arc::new(Self {
                name,
                supported: Platform::ALL.to_vec(),
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(name: &'static str, make: fn() -> TicketError) -> Arc<Self> {
            Arc::new(Self {
                name,
                supported: Platform::ALL.to_vec(),
                reply: Err(make),
                calls: AtomicUsize::new(0),
            })
        }

        fn limited_to(mut self: Arc<Self>, platforms: &[Platform]) -> Arc<Self> {
            Arc::get_mut(&mut self).unwrap().supported = platforms.to_vec();
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TicketFetcher for StubFetcher {
        fn name(&self) -> &str {
            self.name
        }
        fn supports_platform(&self, platform: Platform) -> bool {
            self.supported.contains(&platform)
        }
        async fn fetch_raw(
            &self,
            _ticket_id: &str,
            _platform: Platform,
            _timeout: Option<Duration>,
        ) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn jira_raw() -> Value {
        json!({
            "key": "PROJ-123",
            "fields": {
                "summary": "Test Ticket",
                "status": {"name": "In Progress"},
                "issuetype": {"name": "Story"}
            }
        })
    }

    fn service(
        primary: Arc<dyn TicketFetcher>,
        fallback: Option<Arc<dyn TicketFetcher>>,
        cache: Option<Arc<dyn TicketCache>>,
    ) -> TicketService {
        TicketService::new(
            Arc::new(ProviderRegistry::with_default_providers(ProviderDeps::default())),
            primary,
            fallback,
            cache,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn successful_fetch_normalizes() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let svc = service(primary.clone(), None, None);

        let ticket = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        assert_eq!(ticket.id, "PROJ-123");
        assert_eq!(ticket.platform, Platform::Jira);
        assert_eq!(ticket.title, "Test Ticket");
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn unrecognized_input_fails_before_any_fetch() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let svc = service(primary.clone(), None, None);

        let err = svc.get_ticket("???", GetTicketOptions::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::UnsupportedInput { .. }));
        assert_eq!(primary.call_count(), 0);
    }

    #[tokio::test]
    async fn cache_hit_skips_fetch() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let cache: Arc<dyn TicketCache> = Arc::new(MemoryTicketCache::default());
        let svc = service(primary.clone(), None, Some(cache));

        let first = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        let second = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(primary.call_count(), 1);
    }

    #[tokio::test]
    async fn skip_cache_bypasses_read_but_still_writes() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let cache = Arc::new(MemoryTicketCache::default());
        let svc = service(primary.clone(), None, Some(cache.clone() as Arc<dyn TicketCache>));

        svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        svc.get_ticket(
            "PROJ-123",
            GetTicketOptions {
                skip_cache: true,
                ttl: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(primary.call_count(), 2);
        assert_eq!(cache.size(), 1);
    }

    #[tokio::test]
    async fn ttl_override_applies_to_cache_write() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let cache = Arc::new(MemoryTicketCache::default());
        let svc = service(primary, None, Some(cache.clone() as Arc<dyn TicketCache>));

        svc.get_ticket(
            "PROJ-123",
            GetTicketOptions {
                skip_cache: false,
                ttl: Some(Duration::from_secs(120)),
            },
        )
        .await
        .unwrap();

        let entry = cache
            .get_entry(&CacheKey::new(Platform::Jira, "PROJ-123"))
            .unwrap();
        assert!(entry.ttl_remaining() <= Duration::from_secs(120));
    }

    #[tokio::test]
    async fn fallback_fires_on_eligible_error() {
        let primary = StubFetcher::failing("primary", || TicketError::AgentResponseParse {
            agent: "primary".into(),
            message: "bad json".into(),
            raw_preview: String::new(),
        });
        let fallback = StubFetcher::returning("fallback", jira_raw());
        let svc = service(primary.clone(), Some(fallback.clone()), None);

        let ticket = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        assert_eq!(ticket.id, "PROJ-123");
        assert_eq!(primary.call_count(), 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn ineligible_error_propagates_without_fallback_attempt() {
        let primary = StubFetcher::failing("primary", || TicketError::PlatformNotFound {
            platform: "JIRA".into(),
            ticket_id: "PROJ-123".into(),
        });
        let fallback = StubFetcher::returning("fallback", jira_raw());
        let svc = service(primary, Some(fallback.clone()), None);

        let err = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::PlatformNotFound { .. }));
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn eligible_error_propagates_when_no_fallback() {
        let primary = StubFetcher::failing("primary", || TicketError::AgentFetch {
            agent: "primary".into(),
            message: "boom".into(),
        });
        let cache = Arc::new(MemoryTicketCache::default());
        let svc = service(primary, None, Some(cache.clone() as Arc<dyn TicketCache>));

        let err = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::AgentFetch { .. }));
        // Failed fetches never write cache entries.
        assert_eq!(cache.size(), 0);
    }

    #[tokio::test]
    async fn unsupported_primary_platform_goes_straight_to_fallback() {
        let primary = StubFetcher::returning("primary", jira_raw())
            .limited_to(&[Platform::Jira, Platform::Linear, Platform::Github]);
        let fallback = StubFetcher::returning("fallback", json!({"id": 9, "shortLink": "abcd1234"}));
        let svc = service(primary.clone(), Some(fallback.clone()), None);

        svc.get_ticket("https://trello.com/c/abcd1234/x", GetTicketOptions::default())
            .await
            .unwrap();
        assert_eq!(primary.call_count(), 0);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn no_capable_fetcher_is_platform_not_supported() {
        let primary = StubFetcher::returning("primary", jira_raw()).limited_to(&[Platform::Jira]);
        let svc = service(primary, None, None);

        let err = svc
            .get_ticket("https://trello.com/c/abcd1234/x", GetTicketOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::PlatformNotSupported { .. }));
    }

    #[tokio::test]
    async fn fallback_not_supporting_platform_is_not_consulted() {
        let primary = StubFetcher::failing("primary", || TicketError::AgentFetch {
            agent: "primary".into(),
            message: "boom".into(),
        });
        let fallback =
            StubFetcher::returning("fallback", jira_raw()).limited_to(&[Platform::Trello]);
        let svc = service(primary, Some(fallback.clone()), None);

        let err = svc.get_ticket("PROJ-1", GetTicketOptions::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::AgentFetch { .. }));
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn closed_service_rejects_requests() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let svc = service(primary, None, None);
        svc.close().await;

        let err = svc.get_ticket("PROJ-1", GetTicketOptions::default()).await.unwrap_err();
        match err {
            TicketError::Service(message) => assert!(message.contains("has been closed")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        struct CountingFetcher {
            closes: AtomicUsize,
        }
        #[async_trait]
        impl TicketFetcher for CountingFetcher {
            fn name(&self) -> &str {
                "counting"
            }
            fn supports_platform(&self, _platform: Platform) -> bool {
                true
            }
            async fn fetch_raw(
                &self,
                _ticket_id: &str,
                _platform: Platform,
                _timeout: Option<Duration>,
            ) -> Result<Value> {
                Ok(json!({}))
            }
            async fn close(&self) {
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
        }

        let fallback = Arc::new(CountingFetcher { closes: AtomicUsize::new(0) });
        let svc = service(
            StubFetcher::returning("primary", jira_raw()),
            Some(fallback.clone()),
            None,
        );
        svc.close().await;
        svc.close().await;
        assert_eq!(fallback.closes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn run_scoped_closes_on_success_and_error() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let svc = service(primary, None, None);
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);

        let result = run_scoped(svc, |svc| async move {
            let ticket = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await?;
            *seen_clone.lock().unwrap() = Some(svc);
            Ok(ticket)
        })
        .await
        .unwrap();
        assert_eq!(result.id, "PROJ-123");

        // The service captured inside the scope is closed afterwards.
        let svc = seen.lock().unwrap().take().unwrap();
        let err = svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap_err();
        assert!(matches!(err, TicketError::Service(_)));

        // The error path closes too.
        let failing = service(
            StubFetcher::failing("primary", || TicketError::AgentFetch {
                agent: "primary".into(),
                message: "boom".into(),
            }),
            None,
            None,
        );
        let err = run_scoped(failing, |svc| async move {
            svc.get_ticket("PROJ-123", GetTicketOptions::default()).await
        })
        .await
        .unwrap_err();
        assert!(matches!(err, TicketError::AgentFetch { .. }));
    }

    #[tokio::test]
    async fn cache_admin_helpers() {
        let primary = StubFetcher::returning("primary", jira_raw());
        let cache = Arc::new(MemoryTicketCache::default());
        let svc = service(primary.clone(), None, Some(cache.clone() as Arc<dyn TicketCache>));

        svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        assert!(svc.has_cache());
        assert_eq!(cache.size(), 1);

        svc.invalidate_cache(Platform::Jira, "PROJ-123");
        assert_eq!(cache.size(), 0);

        svc.get_ticket("PROJ-123", GetTicketOptions::default()).await.unwrap();
        svc.clear_cache(Some(Platform::Linear));
        assert_eq!(cache.size(), 1);
        svc.clear_cache(None);
        assert_eq!(cache.size(), 0);

        // No cache attached: all no-ops.
        let bare = service(primary, None, None);
        assert!(!bare.has_cache());
        bare.invalidate_cache(Platform::Jira, "PROJ-123");
        bare.clear_cache(None);
    }
}
