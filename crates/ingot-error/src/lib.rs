// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy for the ticket acquisition core.
//!
//! Every failure surfaced by the core is a [`TicketError`].  Each variant
//! belongs to a broad [`ErrorCategory`], and fallback eligibility — the
//! property the service layer uses to decide whether a failed primary fetch
//! may be retried through the fallback fetcher — is a total function of the
//! variant ([`TicketError::is_fallback_eligible`]), never a downcast.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that a [`TicketError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// User-correctable input errors (unrecognized reference, bad id format).
    Input,
    /// Missing or malformed fallback credentials.
    Credential,
    /// The ticket does not exist on its platform.
    NotFound,
    /// The platform API returned a logical error.
    RemoteApi,
    /// Agent-mediated fetch failures (misconfiguration, invocation, parse).
    Agent,
    /// AI backend failures surfaced from outside the core.
    Backend,
    /// Misuse of the testing-convenience cache globals.
    Cache,
    /// Transport-layer failures (TLS, DNS, connection reset).
    Transport,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Credential => "credential",
            Self::NotFound => "not_found",
            Self::RemoteApi => "remote_api",
            Self::Agent => "agent",
            Self::Backend => "backend",
            Self::Cache => "cache",
            Self::Transport => "transport",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Failures reported by an AI coding backend.
///
/// Backend implementations live outside the core; the core only observes
/// these typed failures through the backend handle and maps them into agent
/// errors or service-construction errors.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend subprocess did not return within the configured timeout.
    #[error("backend execution timed out after {seconds}s")]
    Timeout {
        /// Timeout that was exceeded, in seconds.
        seconds: u64,
    },

    /// The backend reported a rate limit.
    #[error("backend rate limited: {output}")]
    RateLimit {
        /// The output that triggered rate-limit detection.
        output: String,
    },

    /// The backend CLI is not installed or not on PATH.
    #[error("backend not installed: {0}")]
    NotInstalled(String),

    /// No backend is configured at all.
    #[error("backend not configured: {0}")]
    NotConfigured(String),

    /// The backend invocation failed for any other reason.
    #[error("backend invocation failed: {0}")]
    Invocation(String),
}

// ---------------------------------------------------------------------------
// TicketError
// ---------------------------------------------------------------------------

/// Unified error for every failure path in the ticket acquisition core.
#[derive(Debug, Error)]
pub enum TicketError {
    /// No platform pattern matched the input string.
    #[error("unrecognized ticket reference: '{input}' (known platforms: {})", known_platforms.join(", "))]
    UnsupportedInput {
        /// The offending input, verbatim.
        input: String,
        /// Sorted names of the platforms the detector knows about.
        known_platforms: Vec<String>,
    },

    /// A platform was detected but no provider is registered for it.
    #[error("{message} (registered platforms: {})", registered.join(", "))]
    UnsupportedPlatform {
        /// Human-readable description.
        message: String,
        /// Sorted names of the registered platforms.
        registered: Vec<String>,
    },

    /// A ticket id does not match the format a handler expects.
    #[error("invalid {platform} ticket id '{ticket_id}', expected {expected}")]
    TicketIdFormat {
        /// Platform display name.
        platform: String,
        /// The offending ticket id.
        ticket_id: String,
        /// Expected format description, e.g. `owner/repo#number`.
        expected: String,
    },

    /// Required credential keys are missing or malformed.
    #[error("missing {platform} credentials: {}", missing.join(", "))]
    CredentialValidation {
        /// Platform display name.
        platform: String,
        /// Sorted missing credential keys.
        missing: Vec<String>,
    },

    /// The ticket does not exist on the platform.
    #[error("{platform} ticket not found: {ticket_id}")]
    PlatformNotFound {
        /// Platform display name.
        platform: String,
        /// The ticket id that was looked up.
        ticket_id: String,
    },

    /// The platform API returned a logical error (GraphQL errors array,
    /// non-404 HTTP failure, null data).
    #[error("{platform} API error for {ticket_id}: {details}")]
    PlatformApi {
        /// Platform display name.
        platform: String,
        /// The ticket id the request was for.
        ticket_id: String,
        /// Error details from the platform.
        details: String,
    },

    /// The agent integration is misconfigured (unknown platform, missing
    /// prompt template, unsupported platform for mediated fetch).
    #[error("[{agent}] {message}")]
    AgentIntegration {
        /// Fetcher display name.
        agent: String,
        /// Human-readable description.
        message: String,
    },

    /// The agent invocation failed or timed out.
    #[error("[{agent}] {message}")]
    AgentFetch {
        /// Fetcher display name.
        agent: String,
        /// Human-readable description.
        message: String,
    },

    /// The agent reply could not be parsed into the required JSON shape.
    #[error("[{agent}] {message}")]
    AgentResponseParse {
        /// Fetcher display name.
        agent: String,
        /// Human-readable description.
        message: String,
        /// Truncated raw reply for diagnostics.
        raw_preview: String,
    },

    /// A fetcher was asked for a platform it does not serve.
    #[error("fetcher '{fetcher}' does not support platform {platform}")]
    PlatformNotSupported {
        /// Platform display name.
        platform: String,
        /// Fetcher display name.
        fetcher: String,
    },

    /// A provider rejected raw data during normalization.
    #[error("normalization failed: {0}")]
    Validation(String),

    /// The testing-convenience cache global was requested with parameters
    /// that conflict with the live instance.
    #[error("cache configuration conflict: {0}")]
    CacheConfiguration(String),

    /// A failure reported by the AI backend handle.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Transport-layer failure below the platform API (TLS, DNS, broken
    /// connections). Never fallback-eligible.
    #[error("transport error: {0}")]
    Http(String),

    /// Service misuse, e.g. `get_ticket` after close, or a factory call with
    /// no fetchers configured.
    #[error("{0}")]
    Service(String),
}

impl TicketError {
    /// Returns the broad [`ErrorCategory`] this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedInput { .. }
            | Self::UnsupportedPlatform { .. }
            | Self::TicketIdFormat { .. }
            | Self::PlatformNotSupported { .. }
            | Self::Validation(_)
            | Self::Service(_) => ErrorCategory::Input,

            Self::CredentialValidation { .. } => ErrorCategory::Credential,

            Self::PlatformNotFound { .. } => ErrorCategory::NotFound,

            Self::PlatformApi { .. } => ErrorCategory::RemoteApi,

            Self::AgentIntegration { .. }
            | Self::AgentFetch { .. }
            | Self::AgentResponseParse { .. } => ErrorCategory::Agent,

            Self::Backend(_) => ErrorCategory::Backend,

            Self::CacheConfiguration(_) => ErrorCategory::Cache,

            Self::Http(_) => ErrorCategory::Transport,
        }
    }

    /// Whether the service may recover from this error by trying the
    /// fallback fetcher.
    ///
    /// The set is closed: agent integration, agent fetch, and agent response
    /// parse failures. Not-found, credential, id-format, transport, and
    /// backend-construction errors represent conditions the fallback cannot
    /// fix and propagate unchanged.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            Self::AgentIntegration { .. } | Self::AgentFetch { .. } | Self::AgentResponseParse { .. }
        )
    }
}

/// Convenience alias used across the workspace.
pub type Result<T> = std::result::Result<T, TicketError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
