// SPDX-License-Identifier: MIT OR Apache-2.0
//! Handler registry: platform tag → API handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use ingot_core::Platform;

use crate::handler::PlatformHandler;
use crate::{
    AzureDevopsHandler, GithubHandler, JiraHandler, LinearHandler, MondayHandler, TrelloHandler,
};

/// Immutable map from platform to its API handler.
///
/// Built once at fetcher construction; lookups are lock-free afterwards.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<Platform, Arc<dyn PlatformHandler>>,
}

impl HandlerRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with all six built-in handlers.
    pub fn with_default_handlers() -> Self {
        let mut registry = Self::new();
        registry.insert(Platform::Jira, Arc::new(JiraHandler::new()));
        registry.insert(Platform::Github, Arc::new(GithubHandler::new()));
        registry.insert(Platform::Linear, Arc::new(LinearHandler::new()));
        registry.insert(Platform::AzureDevops, Arc::new(AzureDevopsHandler::new()));
        registry.insert(Platform::Monday, Arc::new(MondayHandler::new()));
        registry.insert(Platform::Trello, Arc::new(TrelloHandler::new()));
        registry
    }

    /// Register (or replace) the handler for a platform.
    pub fn insert(&mut self, platform: Platform, handler: Arc<dyn PlatformHandler>) {
        self.handlers.insert(platform, handler);
    }

    /// Look up the handler for a platform.
    pub fn get(&self, platform: Platform) -> Option<Arc<dyn PlatformHandler>> {
        self.handlers.get(&platform).map(Arc::clone)
    }

    /// Whether a handler is registered for `platform`.
    pub fn supports(&self, platform: Platform) -> bool {
        self.handlers.contains_key(&platform)
    }

    /// Platforms with a registered handler, sorted.
    pub fn platforms(&self) -> Vec<Platform> {
        self.handlers.keys().copied().collect()
    }
}
