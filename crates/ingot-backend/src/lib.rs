// SPDX-License-Identifier: MIT OR Apache-2.0
//! AI coding backend contract and the backend/platform support policy.
//!
//! A backend is the CLI coding agent (Auggie, Claude Code, Cursor) the
//! workflow engine drives. The acquisition core consumes exactly one method
//! from it — [`CodingBackend::run_print_quiet`] — which blocks until the
//! backend subprocess returns its text output. Implementations live outside
//! the core.
//!
//! The static support matrix in this crate decides, at service composition
//! time, which fetch mechanism is feasible for a backend/platform pair.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use std::time::Duration;

use ingot_core::Platform;
use ingot_error::BackendError;

// ---------------------------------------------------------------------------
// BackendKind
// ---------------------------------------------------------------------------

/// The AI coding backends the engine knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Augment's Auggie CLI.
    Auggie,
    /// Anthropic's Claude Code CLI.
    Claude,
    /// Cursor's CLI.
    Cursor,
    /// Aider (no mediated-fetch tooling).
    Aider,
    /// Manual mode — the user drives their own editor.
    Manual,
}

impl BackendKind {
    /// Human-readable backend name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auggie => "Auggie",
            Self::Claude => "Claude",
            Self::Cursor => "Cursor",
            Self::Aider => "Aider",
            Self::Manual => "Manual",
        }
    }

    /// Platforms this backend can serve via agent-mediated fetch.
    pub fn mediated_support(&self) -> &'static [Platform] {
        match self {
            Self::Auggie | Self::Claude | Self::Cursor => {
                &[Platform::Jira, Platform::Linear, Platform::Github]
            }
            Self::Aider | Self::Manual => &[],
        }
    }

    /// Whether this backend can mediate fetches at all.
    pub fn supports_mediated_fetch(&self) -> bool {
        !self.mediated_support().is_empty()
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Support policy
// ---------------------------------------------------------------------------

/// Platforms with a direct REST/GraphQL handler.
pub const API_SUPPORT: &[Platform] = &[
    Platform::Jira,
    Platform::Linear,
    Platform::Github,
    Platform::AzureDevops,
    Platform::Trello,
    Platform::Monday,
];

/// How a backend/platform pair can be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMechanism {
    /// Served through the backend's tool integrations.
    Mediated,
    /// Served through a direct platform API handler.
    Api,
    /// Not servable at all.
    Unsupported,
}

/// Check how a backend supports a ticket platform.
///
/// Mediated fetch wins when available; direct API is the fallback
/// mechanism; anything else is unsupported.
pub fn platform_support(backend: BackendKind, platform: Platform) -> FetchMechanism {
    if backend.mediated_support().contains(&platform) {
        FetchMechanism::Mediated
    } else if API_SUPPORT.contains(&platform) {
        FetchMechanism::Api
    } else {
        FetchMechanism::Unsupported
    }
}

// ---------------------------------------------------------------------------
// CodingBackend
// ---------------------------------------------------------------------------

/// Options for a single backend invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Do not persist this exchange in the backend's session history.
    pub dont_save_session: bool,
    /// Subprocess timeout; `None` uses the backend's own default.
    pub timeout: Option<Duration>,
}

/// Handle to an AI coding backend subprocess.
///
/// The single quiet-print entry point blocks (cooperatively) until the
/// backend returns. An empty reply is valid at this layer; the fetcher
/// above treats it as a failure.
#[async_trait]
pub trait CodingBackend: Send + Sync {
    /// Which backend this handle drives.
    fn kind(&self) -> BackendKind;

    /// Run a prompt through the backend and return its raw text output.
    ///
    /// # Errors
    ///
    /// [`BackendError::Timeout`] when the subprocess exceeds the timeout,
    /// [`BackendError::RateLimit`] when the backend reports throttling,
    /// [`BackendError::NotInstalled`] when the CLI is missing, and
    /// [`BackendError::Invocation`] for any other failure.
    async fn run_print_quiet(&self, prompt: &str, options: RunOptions)
    -> Result<String, BackendError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
