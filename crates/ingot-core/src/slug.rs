// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sanitizers shared by the git-safe derivations on [`crate::GenericTicket`].

/// Sanitize a string component for use in git branch names.
///
/// Output contains only `[a-z0-9-]`: the input is lowercased, every other
/// character becomes a hyphen, consecutive hyphens collapse, and
/// leading/trailing hyphens are stripped. May return an empty string.
pub fn sanitize_for_branch_component(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(value.len());
    let mut last_hyphen = false;
    for ch in value.chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            Some(ch)
        } else {
            // Everything outside [a-z0-9] (including '-') funnels through the
            // hyphen path so runs collapse uniformly.
            None
        };
        match mapped {
            Some(c) => {
                out.push(c);
                last_hyphen = false;
            }
            None => {
                if !last_hyphen && !out.is_empty() {
                    out.push('-');
                }
                last_hyphen = true;
            }
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Sanitize a title for use as a branch summary.
///
/// Truncates to `max_length` characters first, then sanitizes, so the
/// result never exceeds the limit and never ends with a hyphen.
pub fn sanitize_title_for_branch(title: &str, max_length: usize) -> String {
    let truncated: String = title.chars().take(max_length).collect();
    let mut result = sanitize_for_branch_component(&truncated);
    while result.ends_with('-') {
        result.pop();
    }
    result
}

/// Default maximum length for branch summaries.
pub const BRANCH_SUMMARY_MAX_LENGTH: usize = 50;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(
            sanitize_for_branch_component("Fix Login Bug!"),
            "fix-login-bug"
        );
    }

    #[test]
    fn collapses_hyphen_runs() {
        assert_eq!(sanitize_for_branch_component("a -- b__c"), "a-b-c");
    }

    #[test]
    fn strips_leading_and_trailing() {
        assert_eq!(sanitize_for_branch_component("--abc--"), "abc");
    }

    #[test]
    fn empty_and_symbol_only_inputs() {
        assert_eq!(sanitize_for_branch_component(""), "");
        assert_eq!(sanitize_for_branch_component("!!!"), "");
        assert_eq!(sanitize_for_branch_component("💥💥"), "");
    }

    #[test]
    fn github_style_id() {
        assert_eq!(
            sanitize_for_branch_component("owner/repo#42"),
            "owner-repo-42"
        );
    }

    #[test]
    fn title_respects_max_length() {
        let long = "a".repeat(120);
        assert_eq!(sanitize_title_for_branch(&long, 50).len(), 50);
    }

    #[test]
    fn title_truncation_drops_trailing_hyphen() {
        // Truncation at the boundary can land on a separator.
        let title = "implement the brand new login flow for SSO users everywhere";
        let slug = sanitize_title_for_branch(title, BRANCH_SUMMARY_MAX_LENGTH);
        assert!(slug.len() <= BRANCH_SUMMARY_MAX_LENGTH);
        assert!(!slug.ends_with('-'));
    }

    proptest! {
        #[test]
        fn output_is_git_safe(input in ".*") {
            let out = sanitize_for_branch_component(&input);
            prop_assert!(out.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!out.starts_with('-'));
            prop_assert!(!out.ends_with('-'));
            prop_assert!(!out.contains("--"));
        }

        #[test]
        fn title_never_exceeds_limit(input in ".*") {
            let out = sanitize_title_for_branch(&input, BRANCH_SUMMARY_MAX_LENGTH);
            prop_assert!(out.len() <= BRANCH_SUMMARY_MAX_LENGTH);
            prop_assert!(!out.ends_with('-'));
        }
    }
}
