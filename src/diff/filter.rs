//! Keeps sensitive files out of the prompt sent to the AI provider.
//!
//! The diff is filtered per file section, never by rewriting section bodies,
//! so whatever survives is verbatim diff text. Exclusion is glob-based and
//! matches dotfiles, since the highest-value targets (`.env`, key material)
//! are dotfiles.

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use super::section::parse_sections;

/// Paths excluded from the AI prompt unless the user overrides them.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "**/.env*",
    "**/*.pem",
    "**/*.key",
    "**/*.p12",
    "**/*.pfx",
    "**/credentials*",
    "**/secrets*",
    "**/*secret*",
    "**/.ssh/*",
    "**/*.credentials",
];

/// Result of filtering a staged diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDiff {
    /// Surviving sections joined back together, ready for the prompt.
    pub filtered_diff: String,
    /// Paths whose sections were withheld, in diff order.
    pub excluded_files: Vec<String>,
    /// Section count before filtering. Zero means the diff had no
    /// recognizable file headers at all.
    pub total_sections: usize,
}

/// Drop the sections of `diff` whose paths match any exclusion glob.
pub fn filter_sensitive(diff: &str, exclude_patterns: &[String]) -> FilteredDiff {
    let matcher = build_matcher(exclude_patterns);
    let sections = parse_sections(diff);
    let total_sections = sections.len();

    let mut included: Vec<String> = Vec::new();
    let mut excluded_files = Vec::new();
    for section in sections {
        if matcher.is_match(&section.path) {
            debug!(path = %section.path, "withholding sensitive file from prompt");
            excluded_files.push(section.path);
        } else {
            included.push(section.content);
        }
    }

    FilteredDiff {
        filtered_diff: included.join("\n"),
        excluded_files,
        total_sections,
    }
}

/// Compile the exclusion globs. Invalid patterns are skipped with a warning
/// so one bad user pattern cannot disable filtering entirely.
fn build_matcher(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                warn!("Ignoring invalid exclude pattern '{pattern}': {e}");
            }
        }
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build exclusion matcher: {e}; no files will be excluded");
        GlobSet::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Vec<String> {
        DEFAULT_EXCLUDE_PATTERNS.iter().map(|s| s.to_string()).collect()
    }

    fn diff_for(paths: &[&str]) -> String {
        paths
            .iter()
            .map(|p| {
                format!("diff --git a/{p} b/{p}\nindex 1111111..2222222 100644\n--- a/{p}\n+++ b/{p}\n@@ -1 +1 @@\n-old\n+new")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn default_patterns_catch_env_and_key_material() {
        let diff = diff_for(&[".env.local", "config/.env", "certs/server.pem", "id.key"]);
        let result = filter_sensitive(&diff, &defaults());

        assert_eq!(
            result.excluded_files,
            vec![".env.local", "config/.env", "certs/server.pem", "id.key"]
        );
        assert!(result.filtered_diff.is_empty());
        assert_eq!(result.total_sections, 4);
    }

    #[test]
    fn ordinary_source_files_pass_through_verbatim() {
        let diff = diff_for(&["src/main.rs", "README.md"]);
        let result = filter_sensitive(&diff, &defaults());

        assert!(result.excluded_files.is_empty());
        assert_eq!(result.filtered_diff, diff);
    }

    #[test]
    fn mixed_diff_keeps_only_safe_sections() {
        let diff = diff_for(&["src/lib.rs", ".env", "src/util.rs"]);
        let result = filter_sensitive(&diff, &defaults());

        assert_eq!(result.excluded_files, vec![".env"]);
        assert!(result.filtered_diff.contains("a/src/lib.rs"));
        assert!(result.filtered_diff.contains("a/src/util.rs"));
        assert!(!result.filtered_diff.contains("a/.env"));
    }

    #[test]
    fn secret_substring_matches_anywhere_in_filename() {
        let diff = diff_for(&["config/secret_keys.txt", ".ssh/id_rsa"]);
        let result = filter_sensitive(&diff, &defaults());

        assert_eq!(result.excluded_files, vec!["config/secret_keys.txt", ".ssh/id_rsa"]);
    }

    #[test]
    fn user_patterns_extend_the_exclusions() {
        let mut patterns = defaults();
        patterns.push("**/*.sql".to_string());
        let diff = diff_for(&["migrations/001.sql", "src/db.rs"]);
        let result = filter_sensitive(&diff, &patterns);

        assert_eq!(result.excluded_files, vec!["migrations/001.sql"]);
        assert!(result.filtered_diff.contains("src/db.rs"));
    }

    #[test]
    fn invalid_pattern_is_skipped_not_fatal() {
        let patterns = vec!["a[".to_string(), "**/*.pem".to_string()];
        let diff = diff_for(&["certs/server.pem", "src/main.rs"]);
        let result = filter_sensitive(&diff, &patterns);

        assert_eq!(result.excluded_files, vec!["certs/server.pem"]);
        assert!(result.filtered_diff.contains("src/main.rs"));
    }

    #[test]
    fn empty_diff_reports_zero_sections() {
        let result = filter_sensitive("", &defaults());

        assert_eq!(result.total_sections, 0);
        assert!(result.filtered_diff.is_empty());
        assert!(result.excluded_files.is_empty());
    }

    #[test]
    fn fully_excluded_diff_is_distinguishable_from_headerless_diff() {
        let all_secret = filter_sensitive(&diff_for(&[".env"]), &defaults());
        let headerless = filter_sensitive("not a diff at all\n", &defaults());

        assert_eq!(all_secret.total_sections, 1);
        assert!(all_secret.filtered_diff.is_empty());
        assert_eq!(headerless.total_sections, 0);
    }
}
