// SPDX-License-Identifier: MIT OR Apache-2.0
//! Service composition.

use std::sync::Arc;
use std::time::Duration;

use ingot_backend::CodingBackend;
use ingot_cache::{DEFAULT_TTL, MemoryTicketCache, TicketCache};
use ingot_core::AuthManager;
use ingot_error::{Result, TicketError};
use ingot_fetchers::{AgentMediatedFetcher, DirectApiFetcher, TicketFetcher};
use ingot_providers::{ProviderDeps, ProviderRegistry};
use tracing::debug;

use crate::service::TicketService;

/// Composes a [`TicketService`] from a backend handle and/or an
/// authentication manager.
///
/// Topology rules:
/// - a mediated-capable backend → mediated fetcher as primary, and (when an
///   auth manager is present and fallback enabled) the direct-API fetcher
///   as fallback;
/// - an auth manager alone → direct-API primary, no fallback;
/// - neither → a configuration error.
///
/// An in-memory cache with a one-hour TTL is attached unless the caller
/// injects one (or disables caching).
pub struct ServiceBuilder {
    backend: Option<Arc<dyn CodingBackend>>,
    auth: Option<Arc<dyn AuthManager>>,
    cache: Option<Arc<dyn TicketCache>>,
    registry: Option<Arc<ProviderRegistry>>,
    default_ttl: Duration,
    enable_fallback: bool,
    enable_cache: bool,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceBuilder {
    /// Empty builder.
    pub fn new() -> Self {
        Self {
            backend: None,
            auth: None,
            cache: None,
            registry: None,
            default_ttl: DEFAULT_TTL,
            enable_fallback: true,
            enable_cache: true,
        }
    }

    /// Use an AI backend for agent-mediated fetching.
    pub fn backend(mut self, backend: Arc<dyn CodingBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Use an authentication manager for direct-API fetching.
    pub fn auth_manager(mut self, auth: Arc<dyn AuthManager>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Inject a cache instead of the default in-memory one.
    pub fn cache(mut self, cache: Arc<dyn TicketCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run without any cache.
    pub fn without_cache(mut self) -> Self {
        self.enable_cache = false;
        self
    }

    /// Inject a provider registry instead of the default one.
    pub fn registry(mut self, registry: Arc<ProviderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Default TTL for cache writes.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Disable the direct-API fallback even when credentials exist.
    pub fn without_fallback(mut self) -> Self {
        self.enable_fallback = false;
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// [`TicketError::Service`] when neither a mediated-capable backend nor
    /// an authentication manager was provided — no fetchers configured.
    pub fn build(self) -> Result<TicketService> {
        let direct: Option<Arc<dyn TicketFetcher>> = self
            .auth
            .map(|auth| Arc::new(DirectApiFetcher::new(auth)) as Arc<dyn TicketFetcher>);

        let mediated: Option<Arc<dyn TicketFetcher>> = self
            .backend
            .filter(|backend| backend.kind().supports_mediated_fetch())
            .map(|backend| {
                let fetcher = match backend.kind() {
                    ingot_backend::BackendKind::Auggie => AgentMediatedFetcher::auggie(backend),
                    ingot_backend::BackendKind::Claude => AgentMediatedFetcher::claude(backend),
                    ingot_backend::BackendKind::Cursor => AgentMediatedFetcher::cursor(backend),
                    // Filtered above; unreachable by construction.
                    other => unreachable!("backend {other} has no mediated support"),
                };
                Arc::new(fetcher) as Arc<dyn TicketFetcher>
            });

        let (primary, fallback) = match (mediated, direct) {
            (Some(mediated), Some(direct)) if self.enable_fallback => (mediated, Some(direct)),
            (Some(mediated), _) => (mediated, None),
            (None, Some(direct)) => (direct, None),
            (None, None) => {
                return Err(TicketError::Service(
                    "cannot build ticket service: no fetchers configured \
                     (need a mediated-capable backend or an authentication manager)"
                        .into(),
                ));
            }
        };

        let cache = if self.enable_cache {
            Some(self.cache.unwrap_or_else(|| {
                Arc::new(MemoryTicketCache::new(self.default_ttl, 0)) as Arc<dyn TicketCache>
            }))
        } else {
            None
        };

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(ProviderRegistry::with_default_providers(ProviderDeps::default())));

        debug!("ticket service assembled");
        Ok(TicketService::new(
            registry,
            primary,
            fallback,
            cache,
            self.default_ttl,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
