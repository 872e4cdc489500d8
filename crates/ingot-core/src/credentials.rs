// SPDX-License-Identifier: MIT OR Apache-2.0
//! Credential contract for the direct-API fetch path.
//!
//! Primary authentication is handled by the connected AI backend's own tool
//! integrations; the credentials managed here are the fallback used when a
//! ticket is fetched straight from the platform API. The core consumes only
//! canonical credential keys — alias resolution (`org` → `organization`,
//! `base_url` → `url`, ...) is the configuration loader's job and happens
//! before credentials reach this layer. Raw secret values flow handler →
//! request headers and are never logged.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::ticket::Platform;

/// Canonical required credential keys per platform.
pub fn required_credential_keys(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Jira => &["url", "email", "token"],
        Platform::Github => &["token"],
        Platform::Linear => &["api_key"],
        Platform::AzureDevops => &["organization", "pat"],
        Platform::Monday => &["api_key"],
        Platform::Trello => &["api_key", "token"],
    }
}

/// Credentials for a specific platform.
///
/// Frozen by value semantics: the map is owned and never handed out
/// mutably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCredentials {
    /// The platform these credentials are for.
    pub platform: Platform,
    /// Whether valid credentials are available.
    pub is_configured: bool,
    /// Canonical key → value pairs; empty when not configured.
    pub credentials: BTreeMap<String, String>,
    /// Why credentials are unavailable, when they are.
    pub error_message: Option<String>,
}

impl PlatformCredentials {
    /// Configured credentials from a canonical key/value map.
    pub fn configured(platform: Platform, credentials: BTreeMap<String, String>) -> Self {
        Self {
            platform,
            is_configured: true,
            credentials,
            error_message: None,
        }
    }

    /// Unconfigured credentials with an explanation.
    pub fn unconfigured(platform: Platform, error_message: impl Into<String>) -> Self {
        Self {
            platform,
            is_configured: false,
            credentials: BTreeMap::new(),
            error_message: Some(error_message.into()),
        }
    }
}

/// Source of fallback credentials, consumed by the direct-API fetcher.
pub trait AuthManager: Send + Sync {
    /// Fetch credentials for a platform, configured or not.
    fn get_credentials(&self, platform: Platform) -> PlatformCredentials;

    /// Quick check whether any fallback credentials exist for a platform.
    ///
    /// Lightweight by design: verifies at least one required key is present
    /// without full validation.
    fn has_fallback_configured(&self, platform: Platform) -> bool {
        let creds = self.get_credentials(platform);
        creds.is_configured
            && required_credential_keys(platform)
                .iter()
                .any(|key| creds.credentials.contains_key(*key))
    }

    /// Format-validate credentials: all required fields present, none empty.
    ///
    /// Makes no API call; connectivity problems surface from the handler.
    fn validate_credentials(&self, platform: Platform) -> (bool, String) {
        let creds = self.get_credentials(platform);
        if !creds.is_configured {
            return (
                false,
                creds
                    .error_message
                    .unwrap_or_else(|| "Credentials not configured".to_string()),
            );
        }
        let empty: Vec<&str> = creds
            .credentials
            .iter()
            .filter(|(_, v)| v.is_empty())
            .map(|(k, _)| k.as_str())
            .collect();
        if !empty.is_empty() {
            return (false, format!("Empty credential values for: {}", empty.join(", ")));
        }
        let missing: Vec<&str> = required_credential_keys(platform)
            .iter()
            .copied()
            .filter(|key| !creds.credentials.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return (false, format!("Missing credential keys: {}", missing.join(", ")));
        }
        (true, format!("Credentials configured for {}", platform.as_str()))
    }

    /// Platforms for which fallback credentials are configured.
    fn list_fallback_platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .iter()
            .copied()
            .filter(|p| self.has_fallback_configured(*p))
            .collect()
    }
}

/// An [`AuthManager`] backed by an in-memory credential table.
///
/// The configuration layer canonicalizes keys and hands the resulting table
/// to this manager at composition time. Also the natural test double.
#[derive(Debug, Default)]
pub struct StaticAuthManager {
    table: Mutex<BTreeMap<Platform, BTreeMap<String, String>>>,
}

impl StaticAuthManager {
    /// Empty manager: every platform reports unconfigured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Install credentials for a platform.
    pub fn insert(&self, platform: Platform, creds: &[(&str, &str)]) {
        let map = creds
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.table.lock().expect("auth table lock").insert(platform, map);
    }

    /// Remove credentials for a platform.
    pub fn remove(&self, platform: Platform) {
        self.table.lock().expect("auth table lock").remove(&platform);
    }
}

impl AuthManager for StaticAuthManager {
    fn get_credentials(&self, platform: Platform) -> PlatformCredentials {
        let table = self.table.lock().expect("auth table lock");
        match table.get(&platform) {
            Some(map) => PlatformCredentials::configured(platform, map.clone()),
            None => PlatformCredentials::unconfigured(
                platform,
                format!(
                    "No fallback credentials configured for {}",
                    platform.lower_name()
                ),
            ),
        }
    }
}
