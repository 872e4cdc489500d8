// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rate-limit retry configuration.
//!
//! The core itself never wraps fetcher calls in retry loops; this
//! configuration and the backoff calculation are consumed by the workflow
//! layer around the backend subprocess call.

use rand::Rng;
use std::time::Duration;

/// Retry policy applied around backend invocations by the workflow layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Maximum retry attempts before giving up.
    pub max_retries: u32,
    /// Base delay for the exponential backoff.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Jitter as a fraction of the exponential delay (0.0 disables jitter).
    pub jitter_factor: f64,
    /// HTTP status codes considered retryable.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            jitter_factor: 0.5,
            retryable_status_codes: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RateLimitConfig {
    /// Whether an HTTP status code should be retried under this policy.
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }
}

/// Delay before retry `attempt` (0-indexed): `min(base * 2^attempt + jitter,
/// max)` where jitter is uniform in `[0, jitter_factor * exponential)`.
///
/// The jitter spreads out concurrent retries so they do not stampede the
/// API at the same instant.
pub fn backoff_delay<R: Rng + ?Sized>(attempt: u32, config: &RateLimitConfig, rng: &mut R) -> Duration {
    let exponential = config.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
    let jitter = if config.jitter_factor > 0.0 {
        rng.random_range(0.0..config.jitter_factor * exponential)
    } else {
        0.0
    };
    let delay = (exponential + jitter).min(config.max_delay.as_secs_f64());
    Duration::from_secs_f64(delay)
}
