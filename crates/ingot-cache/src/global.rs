// SPDX-License-Identifier: MIT OR Apache-2.0
//! Process-wide cache singleton, for tests only.
//!
//! Production code injects a cache into the service directly. This
//! accessor exists so test suites can share one cache without threading it
//! everywhere, and its deliberately awkward name is the reminder. Asking
//! for the singleton with parameters that conflict with the live instance
//! is a configuration error in strict mode and a logged warning otherwise.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ingot_error::{Result, TicketError};
use tracing::{info, warn};

use crate::cache::TicketCache;
use crate::file::FileTicketCache;
use crate::memory::MemoryTicketCache;

/// Which cache variant the singleton should hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalCacheKind {
    /// [`MemoryTicketCache`].
    Memory,
    /// [`FileTicketCache`].
    File,
}

/// Construction parameters for the singleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalCacheParams {
    /// Variant to construct.
    pub kind: GlobalCacheKind,
    /// Default entry TTL.
    pub default_ttl: Duration,
    /// Size bound (`0` = unbounded).
    pub max_size: usize,
    /// Directory for the file variant; `None` uses the default location.
    pub cache_dir: Option<PathBuf>,
}

impl Default for GlobalCacheParams {
    fn default() -> Self {
        Self {
            kind: GlobalCacheKind::Memory,
            default_ttl: crate::DEFAULT_TTL,
            max_size: 0,
            cache_dir: None,
        }
    }
}

static GLOBAL_CACHE: Mutex<Option<(GlobalCacheParams, Arc<dyn TicketCache>)>> = Mutex::new(None);

/// Get or create the process-wide cache singleton.
///
/// # Errors
///
/// [`TicketError::CacheConfiguration`] when `strict` and the live instance
/// was created with different parameters; non-strict mode logs a warning
/// and returns the live instance unchanged. The mismatch is never raised
/// on a hit/miss path — only here, at acquisition.
pub fn testing_global_cache(
    params: GlobalCacheParams,
    strict: bool,
) -> Result<Arc<dyn TicketCache>> {
    let mut global = GLOBAL_CACHE.lock().expect("global cache lock");

    if let Some((live_params, live_cache)) = global.as_ref() {
        if *live_params != params {
            let message = format!(
                "global cache already initialized with {live_params:?}, requested {params:?}; \
                 clear it first to reinitialize"
            );
            if strict {
                return Err(TicketError::CacheConfiguration(message));
            }
            warn!("{message}");
        }
        return Ok(Arc::clone(live_cache));
    }

    let cache: Arc<dyn TicketCache> = match params.kind {
        GlobalCacheKind::Memory => {
            info!("initialized in-memory ticket cache");
            Arc::new(MemoryTicketCache::new(params.default_ttl, params.max_size))
        }
        GlobalCacheKind::File => {
            let cache = match &params.cache_dir {
                Some(dir) => FileTicketCache::new(dir, params.default_ttl, params.max_size),
                None => FileTicketCache::at_default_location(params.default_ttl, params.max_size),
            }
            .map_err(|e| TicketError::CacheConfiguration(format!("cache dir unusable: {e}")))?;
            info!("initialized file-based ticket cache");
            Arc::new(cache)
        }
    };

    *global = Some((params, Arc::clone(&cache)));
    Ok(cache)
}

/// Replace the singleton with an externally built cache.
pub fn swap_testing_global_cache(params: GlobalCacheParams, cache: Arc<dyn TicketCache>) {
    let mut global = GLOBAL_CACHE.lock().expect("global cache lock");
    *global = Some((params, cache));
}

/// Clear and drop the singleton.
pub fn clear_testing_global_cache() {
    let mut global = GLOBAL_CACHE.lock().expect("global cache lock");
    if let Some((_, cache)) = global.take() {
        cache.clear();
    }
}
