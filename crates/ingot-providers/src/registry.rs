// SPDX-License-Identifier: MIT OR Apache-2.0
//! Provider registry: platform tag → lazily-created provider singleton.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ingot_core::Platform;
use ingot_detect::detect;
use ingot_error::{Result, TicketError};
use tracing::{debug, warn};

use crate::provider::{ProviderDeps, TicketProvider};
use crate::{
    AzureDevopsProvider, GithubProvider, JiraProvider, LinearProvider, MondayProvider,
    TrelloProvider,
};

/// A registered provider factory.
///
/// The registry stores factories rather than instances so dependency
/// injection stays explicit: construction receives the current
/// [`ProviderDeps`] and returns a ready provider.
#[derive(Clone)]
pub struct ProviderFactory {
    /// Platform this factory builds a provider for.
    pub platform: Platform,
    /// Stable identifier used to detect re-registration of the same factory.
    pub id: &'static str,
    /// Constructor.
    pub build: fn(&ProviderDeps) -> Arc<dyn TicketProvider>,
}

struct RegistryState {
    factories: BTreeMap<Platform, ProviderFactory>,
    instances: BTreeMap<Platform, Arc<dyn TicketProvider>>,
    deps: ProviderDeps,
}

/// Thread-safe registry of ticket providers.
///
/// All state sits behind a single mutex; singleton creation happens inside
/// the lock so two racing callers observe one instance. Updating the
/// dependency bundle does **not** mutate already-created singletons — call
/// [`ProviderRegistry::reset_instances`] first when new deps must take
/// effect.
pub struct ProviderRegistry {
    state: Mutex<RegistryState>,
}

impl ProviderRegistry {
    /// Empty registry with the given dependency bundle.
    pub fn new(deps: ProviderDeps) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                factories: BTreeMap::new(),
                instances: BTreeMap::new(),
                deps,
            }),
        }
    }

    /// Registry pre-loaded with all six built-in providers.
    pub fn with_default_providers(deps: ProviderDeps) -> Self {
        let registry = Self::new(deps);
        registry.register(JiraProvider::factory());
        registry.register(GithubProvider::factory());
        registry.register(LinearProvider::factory());
        registry.register(AzureDevopsProvider::factory());
        registry.register(MondayProvider::factory());
        registry.register(TrelloProvider::factory());
        registry
    }

    /// Register a provider factory.
    ///
    /// Re-registering the same factory for a platform is a no-op.
    /// Registering a *different* factory replaces the old one, clears any
    /// cached instance, and logs a warning.
    pub fn register(&self, factory: ProviderFactory) {
        let mut state = self.state.lock().expect("registry lock");
        let platform = factory.platform;
        if let Some(existing) = state.factories.get(&platform) {
            if existing.id == factory.id {
                debug!(platform = %platform, factory = factory.id, "provider already registered");
                return;
            }
            warn!(
                platform = %platform,
                old = existing.id,
                new = factory.id,
                "replacing registered provider"
            );
            state.instances.remove(&platform);
        }
        state.factories.insert(platform, factory);
    }

    /// Get the singleton provider for a platform, creating it on first use.
    ///
    /// # Errors
    ///
    /// [`TicketError::UnsupportedPlatform`] when no factory is registered,
    /// carrying the sorted list of registered platforms.
    pub fn get_provider(&self, platform: Platform) -> Result<Arc<dyn TicketProvider>> {
        let mut state = self.state.lock().expect("registry lock");
        if let Some(instance) = state.instances.get(&platform) {
            return Ok(Arc::clone(instance));
        }
        let Some(factory) = state.factories.get(&platform) else {
            return Err(TicketError::UnsupportedPlatform {
                message: format!("no provider registered for platform: {}", platform.as_str()),
                registered: Self::registered_names(&state),
            });
        };
        let instance = (factory.build)(&state.deps);
        state.instances.insert(platform, Arc::clone(&instance));
        Ok(instance)
    }

    /// Detect the platform for an input and return its provider.
    ///
    /// Every detector failure is normalized to the unsupported-input error
    /// surface so callers see one stable error shape.
    pub fn get_provider_for_input(&self, input: &str) -> Result<Arc<dyn TicketProvider>> {
        let (platform, _kind) = detect(input)?;
        self.get_provider(platform)
    }

    /// Sorted list of platforms with a registered factory.
    pub fn list_platforms(&self) -> Vec<Platform> {
        let state = self.state.lock().expect("registry lock");
        state.factories.keys().copied().collect()
    }

    /// Replace the configuration part of the dependency bundle.
    ///
    /// Existing singletons keep the deps they were built with.
    pub fn set_config(&self, config: crate::ProviderConfig) {
        let mut state = self.state.lock().expect("registry lock");
        state.deps.config = config;
    }

    /// Replace the user-interaction capability.
    ///
    /// Existing singletons keep the deps they were built with.
    pub fn set_user_interaction(&self, ui: Arc<dyn crate::UserInteraction>) {
        let mut state = self.state.lock().expect("registry lock");
        state.deps.user_interaction = ui;
    }

    /// Drop all cached instances and reset deps to defaults, preserving
    /// factory registrations.
    pub fn reset_instances(&self) {
        let mut state = self.state.lock().expect("registry lock");
        state.instances.clear();
        state.deps = ProviderDeps::default();
    }

    /// Drop everything: factories, instances, and deps.
    pub fn clear(&self) {
        let mut state = self.state.lock().expect("registry lock");
        state.factories.clear();
        state.instances.clear();
        state.deps = ProviderDeps::default();
    }

    fn registered_names(state: &RegistryState) -> Vec<String> {
        state
            .factories
            .keys()
            .map(|p| p.as_str().to_string())
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_default_providers(ProviderDeps::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
