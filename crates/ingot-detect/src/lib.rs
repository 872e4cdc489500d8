// SPDX-License-Identifier: MIT OR Apache-2.0
//! Format-based platform detection for ticket references.
//!
//! Given an arbitrary user input string, [`detect`] returns the platform
//! most likely to own it. Detection is intentionally shape-based — only the
//! string's format is inspected, never its content on the wire.
//!
//! Two priority tiers: anchored URL patterns first (a URL is unambiguous),
//! then full-string ID patterns. Within a tier the first declared match
//! wins. The `PROJECT-123` shape overlaps between Jira and Linear; Jira is
//! declared first and claims it deterministically, with disambiguation left
//! to the layer above (configured default or user prompt).

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::sync::LazyLock;

use ingot_core::Platform;
use ingot_error::TicketError;
use regex::Regex;

/// Which tier of pattern matched an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Matched a platform URL pattern.
    Url,
    /// Matched a full-string ticket id pattern.
    Id,
}

struct PlatformPattern {
    platform: Platform,
    regex: &'static LazyLock<Regex>,
}

macro_rules! pattern {
    ($name:ident, $re:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("pattern compiles"));
    };
}

// URL tier. Scheme and host are anchored so one platform's URLs are never
// claimed by another's pattern (e.g. linear.app issue URLs vs the generic
// Jira /browse/ shape).
pattern!(GITHUB_URL, r"(?i)^https?://github\.com/[^/]+/[^/]+/(?:issues|pull)/\d+");
pattern!(
    LINEAR_URL,
    r"(?i)^https?://linear\.app/[^/]+/issue/[A-Z][A-Z0-9]*-\d+(?:/[^/]*)?$"
);
pattern!(
    AZURE_DEVOPS_URL,
    r"(?i)^https?://dev\.azure\.com/[^/]+/[^/]+/_workitems/edit/\d+"
);
pattern!(
    VISUALSTUDIO_URL,
    r"(?i)^https?://[^.]+\.visualstudio\.com/[^/]+/_workitems/edit/\d+"
);
pattern!(
    MONDAY_URL,
    r"(?i)^https?://(?:[^.]+\.)?monday\.com/boards/\d+(?:/views/\d+)?/pulses/\d+"
);
pattern!(TRELLO_URL, r"(?i)^https?://trello\.com/c/[A-Z0-9]+");
pattern!(JIRA_URL, r"(?i)^https?://[^/]+/browse/[A-Z][A-Z0-9]*-\d+");

// ID tier. Every pattern is a full-string match so partial garbage like
// `ENG-123abc` or `AMI-18-implement-feature` never detects.
pattern!(JIRA_ID, r"(?i)^[A-Z][A-Z0-9]*-\d+$");
pattern!(AZURE_DEVOPS_ID, r"(?i)^AB#\d+$");
pattern!(GITHUB_SHORT_REF, r"^[^/\s]+/[^/#\s]+#\d+$");
pattern!(GITHUB_BARE_NUMBER, r"^#\d+$");
pattern!(TRELLO_SHORT_LINK, r"^[A-Za-z0-9]{8}$");

/// URL patterns in declared priority order.
static URL_PATTERNS: LazyLock<Vec<PlatformPattern>> = LazyLock::new(|| {
    vec![
        PlatformPattern { platform: Platform::Github, regex: &GITHUB_URL },
        PlatformPattern { platform: Platform::Linear, regex: &LINEAR_URL },
        PlatformPattern { platform: Platform::AzureDevops, regex: &AZURE_DEVOPS_URL },
        PlatformPattern { platform: Platform::AzureDevops, regex: &VISUALSTUDIO_URL },
        PlatformPattern { platform: Platform::Monday, regex: &MONDAY_URL },
        PlatformPattern { platform: Platform::Trello, regex: &TRELLO_URL },
        // Generic host; declared last among URLs so specific hosts win.
        PlatformPattern { platform: Platform::Jira, regex: &JIRA_URL },
    ]
});

/// ID patterns in declared priority order. Jira precedes Linear for the
/// shared `PROJECT-123` shape; the Linear claim is resolved upstream.
static ID_PATTERNS: LazyLock<Vec<PlatformPattern>> = LazyLock::new(|| {
    vec![
        PlatformPattern { platform: Platform::Jira, regex: &JIRA_ID },
        PlatformPattern { platform: Platform::AzureDevops, regex: &AZURE_DEVOPS_ID },
        PlatformPattern { platform: Platform::Github, regex: &GITHUB_SHORT_REF },
        PlatformPattern { platform: Platform::Github, regex: &GITHUB_BARE_NUMBER },
        PlatformPattern { platform: Platform::Trello, regex: &TRELLO_SHORT_LINK },
    ]
});

/// Classify an input string to the platform most likely to own it.
///
/// Whitespace is trimmed. URL matches take priority over ID matches; within
/// a tier the first declared pattern wins.
///
/// # Errors
///
/// [`TicketError::UnsupportedInput`] when no pattern matches, carrying the
/// input and the sorted list of known platforms.
pub fn detect(input: &str) -> Result<(Platform, MatchKind), TicketError> {
    let trimmed = input.trim();

    for pattern in URL_PATTERNS.iter() {
        if pattern.regex.is_match(trimmed) {
            return Ok((pattern.platform, MatchKind::Url));
        }
    }

    for pattern in ID_PATTERNS.iter() {
        if pattern.regex.is_match(trimmed) {
            return Ok((pattern.platform, MatchKind::Id));
        }
    }

    Err(TicketError::UnsupportedInput {
        input: trimmed.to_string(),
        known_platforms: known_platforms(),
    })
}

/// Sorted uppercase names of every platform the detector knows about.
pub fn known_platforms() -> Vec<String> {
    Platform::sorted_names()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
