// SPDX-License-Identifier: MIT OR Apache-2.0
//! File-backed persistent ticket cache.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use ingot_core::{GenericTicket, Platform};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use tempfile::Builder;
use tracing::{debug, warn};

use crate::cache::{CacheStats, TicketCache};
use crate::key::{CacheKey, CachedTicket};

/// Eviction scan fires when size exceeds `max_size * 1.1`; the buffer stops
/// oscillation at small sizes where the scan would otherwise run on every
/// write.
const EVICTION_THRESHOLD_RATIO: f64 = 1.1;

/// Fraction of successful writes that trigger an eviction check.
const EVICTION_PROBABILITY: f64 = 0.1;

struct FileState {
    approx_size: Option<usize>,
    eviction_rng: Box<dyn RngCore + Send>,
}

/// Persistent ticket cache, one JSON file per entry.
///
/// Writes are atomic (staged in a sibling temp file on the same
/// filesystem, then renamed over the target), so a crash mid-write never
/// leaves a corrupt entry, and the staging file is removed on every failure
/// path. Reads refresh the file's mtime so eviction order reflects real
/// recency. Eviction is lazy and probabilistic: on a successful write,
/// with 10 % probability and only past a headroom threshold, the directory
/// is scanned and oldest-mtime entries are deleted down to `max_size`.
///
/// Safe for one process with many threads; concurrent processes interleave
/// optimistically, last writer wins.
pub struct FileTicketCache {
    cache_dir: PathBuf,
    default_ttl: Duration,
    max_size: usize,
    state: Mutex<FileState>,
}

impl FileTicketCache {
    /// Cache rooted at `cache_dir` (created if absent); `max_size == 0`
    /// disables eviction.
    pub fn new(
        cache_dir: impl Into<PathBuf>,
        default_ttl: Duration,
        max_size: usize,
    ) -> std::io::Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            default_ttl,
            max_size,
            state: Mutex::new(FileState {
                approx_size: None,
                eviction_rng: Box::new(StdRng::from_os_rng()),
            }),
        })
    }

    /// Cache at the default location, `~/.ingot-cache/`.
    pub fn at_default_location(default_ttl: Duration, max_size: usize) -> std::io::Result<Self> {
        Self::new(default_cache_dir(), default_ttl, max_size)
    }

    /// Replace the eviction RNG. Part of the contract: tests drive the
    /// probabilistic eviction deterministically through this.
    pub fn with_eviction_rng(self, rng: impl RngCore + Send + 'static) -> Self {
        self.state.lock().expect("cache lock").eviction_rng = Box::new(rng);
        self
    }

    /// The directory entries live in.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let digest = Sha256::digest(key.ticket_id.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        self.cache_dir
            .join(format!("{}_{}.json", key.platform.as_str(), &hex[..32]))
    }

    /// Stage-and-rename write. The staging file lands in the cache
    /// directory itself so the final rename never crosses filesystems; its
    /// guard removes it on every non-renamed exit.
    fn atomic_write(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        let staged = Builder::new()
            .prefix(".cache_")
            .suffix(".tmp")
            .tempfile_in(&self.cache_dir)?;
        fs::write(staged.path(), contents)?;
        staged.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove_entry_file(&self, path: &Path, state: &mut FileState) {
        if fs::remove_file(path).is_ok() {
            state.approx_size = None;
        }
    }

    /// List `.json` entries with their mtimes, skipping files that vanish
    /// between enumeration and stat (another process may be evicting).
    fn scan_entries(&self) -> Vec<(PathBuf, SystemTime)> {
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            warn!(dir = %self.cache_dir.display(), "failed to scan cache directory");
            return Vec::new();
        };
        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let Ok(mtime) = metadata.modified() else {
                continue;
            };
            files.push((path, mtime));
        }
        files
    }

    fn maybe_evict(&self, state: &mut FileState) {
        if self.max_size == 0 {
            return;
        }
        // Cheap pre-check: a size estimate at or under the bound means no
        // scan can be needed.
        if let Some(approx) = state.approx_size
            && approx <= self.max_size
        {
            return;
        }
        let roll: f64 = state.eviction_rng.random();
        if roll > EVICTION_PROBABILITY {
            return;
        }
        self.evict(state);
    }

    fn evict(&self, state: &mut FileState) {
        if self.max_size == 0 {
            return;
        }
        let mut files = self.scan_entries();
        let current = files.len();
        state.approx_size = Some(current);

        let threshold = (self.max_size as f64 * EVICTION_THRESHOLD_RATIO).ceil() as usize;
        if current <= threshold {
            return;
        }

        files.sort_by_key(|(_, mtime)| *mtime);
        let to_remove = current - self.max_size;
        for (path, _) in files.into_iter().take(to_remove) {
            // Another process may have removed it already.
            if fs::remove_file(&path).is_ok() {
                debug!(file = %path.display(), "LRU evicted");
            }
        }
        state.approx_size = Some(self.max_size);
    }

    /// Run the eviction scan unconditionally, bypassing the probabilistic
    /// gate. Test hook.
    pub fn force_evict(&self) {
        let mut state = self.state.lock().expect("cache lock");
        self.evict(&mut state);
    }
}

/// `~/.ingot-cache`, falling back to a relative path when no home directory
/// is discoverable.
fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ingot-cache")
}

impl TicketCache for FileTicketCache {
    fn get_entry(&self, key: &CacheKey) -> Option<CachedTicket> {
        let path = self.entry_path(key);
        let mut state = self.state.lock().expect("cache lock");

        let contents = fs::read_to_string(&path).ok()?;
        let value: serde_json::Value = match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "unreadable cache file, discarding");
                self.remove_entry_file(&path, &mut state);
                return None;
            }
        };
        let Some(entry) = CachedTicket::from_value(&value) else {
            warn!(file = %path.display(), "failed to deserialize cached ticket, discarding");
            self.remove_entry_file(&path, &mut state);
            return None;
        };
        if entry.is_expired() {
            debug!(key = %key, "cache expired");
            self.remove_entry_file(&path, &mut state);
            return None;
        }

        // Touch so eviction sees real recency, not insertion order. Failure
        // is non-critical; the entry is still served.
        if let Ok(file) = fs::OpenOptions::new().write(true).open(&path) {
            let _ = file.set_modified(SystemTime::now());
        }

        debug!(key = %key, "cache hit");
        Some(entry)
    }

    fn set(&self, ticket: &GenericTicket, ttl: Option<Duration>, etag: Option<String>) {
        let key = CacheKey::from_ticket(ticket);
        let entry = CachedTicket::new(ticket.clone(), ttl.unwrap_or(self.default_ttl), etag);
        let contents = match serde_json::to_string_pretty(&entry.to_value()) {
            Ok(contents) => contents,
            Err(e) => {
                // Opportunistic cache: the entry is simply not cached.
                warn!(key = %key, error = %e, "failed to serialize cache entry, skipping");
                return;
            }
        };

        let path = self.entry_path(&key);
        let mut state = self.state.lock().expect("cache lock");
        let is_new_file = !path.exists();

        if let Err(e) = self.atomic_write(&path, &contents) {
            warn!(key = %key, error = %e, "failed to write cache file, skipping");
            return;
        }
        debug!(key = %key, file = %path.display(), "cached");

        if is_new_file && let Some(approx) = state.approx_size.as_mut() {
            *approx += 1;
        }
        self.maybe_evict(&mut state);
    }

    fn invalidate(&self, key: &CacheKey) {
        let path = self.entry_path(key);
        let mut state = self.state.lock().expect("cache lock");
        if path.exists() {
            self.remove_entry_file(&path, &mut state);
            debug!(key = %key, "invalidated");
        }
    }

    fn clear(&self) {
        let mut state = self.state.lock().expect("cache lock");
        let mut count = 0usize;
        for (path, _) in self.scan_entries() {
            if fs::remove_file(path).is_ok() {
                count += 1;
            }
        }
        state.approx_size = Some(0);
        debug!(count, "cleared cache files");
    }

    fn clear_platform(&self, platform: Platform) {
        let prefix = format!("{}_", platform.as_str());
        let mut state = self.state.lock().expect("cache lock");
        let mut count = 0usize;
        for (path, _) in self.scan_entries() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with(&prefix) && fs::remove_file(&path).is_ok() {
                count += 1;
            }
        }
        state.approx_size = None;
        debug!(count, platform = %platform, "cleared platform cache files");
    }

    fn size(&self) -> usize {
        let mut state = self.state.lock().expect("cache lock");
        let count = self.scan_entries().len();
        state.approx_size = Some(count);
        count
    }

    fn stats(&self) -> CacheStats {
        let _state = self.state.lock().expect("cache lock");
        let mut stats = CacheStats::new();
        for (path, _) in self.scan_entries() {
            let name = path.file_stem().and_then(|n| n.to_str()).unwrap_or("");
            // Filename format: PLATFORM_<hash>. AZURE_DEVOPS contains an
            // underscore itself, so split at the final one.
            let platform = name.rsplit_once('_').map(|(p, _)| p).unwrap_or(name);
            *stats.entry(platform.to_string()).or_insert(0) += 1;
        }
        stats
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
