// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-interaction capability injected into providers.
//!
//! Providers never print or prompt directly; anything interactive goes
//! through this trait so the CLI layer can supply a real implementation and
//! tests (or non-interactive runs) can supply a silent one.

/// Interactive capability available to providers.
pub trait UserInteraction: Send + Sync {
    /// Ask the user to pick one of `options`; `None` means no selection was
    /// possible (non-interactive environment or cancellation).
    fn select(&self, message: &str, options: &[String]) -> Option<usize>;

    /// Ask the user a yes/no question; non-interactive implementations
    /// answer `false`.
    fn confirm(&self, message: &str) -> bool;
}

/// Non-interactive implementation: never selects, never confirms.
///
/// The default injected by [`crate::ProviderDeps::default`]; production
/// composition replaces it with the CLI's interactive implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentInteraction;

impl UserInteraction for SilentInteraction {
    fn select(&self, _message: &str, _options: &[String]) -> Option<usize> {
        None
    }

    fn confirm(&self, _message: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_interaction_declines_everything() {
        let ui = SilentInteraction;
        assert_eq!(ui.select("pick", &["a".into(), "b".into()]), None);
        assert!(!ui.confirm("sure?"));
    }
}
