//! Commit plans: structured provider replies and split-plan validation.

pub mod dedup;
pub mod parse;

pub use dedup::{DedupResult, dedup_commits};
pub use parse::{outcome_from_raw, parse_generate_response};

use serde::Deserialize;

/// One commit proposed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitSuggestion {
    /// Commit message, imperative mood per the prompt contract.
    pub message: String,
    /// Repo-relative paths this commit claims. Untrusted until resolved
    /// against the staged file list.
    pub files: Vec<String>,
    /// Model's rationale for the grouping. Required by the schema; replies
    /// without it are treated as unstructured.
    pub reasoning: String,
}

/// The provider's structured reply as it appears on the wire, after any
/// fenced-code-block wrapper has been stripped.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateResponse {
    pub suggest_split: bool,
    pub commits: Vec<CommitSuggestion>,
}

/// Normalized result of one generation call. Always usable: a reply that
/// failed structured parsing degrades to its raw text as `message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOutcome {
    /// Best single commit message for the whole diff.
    pub message: String,
    pub split_suggested: bool,
    pub commits: Vec<CommitSuggestion>,
}

/// Validated plan driving the commit workflow.
///
/// `split_suggested` is only true when at least two commits survived
/// deduplication, so downstream code can branch on it without re-checking
/// commit counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratePlan {
    pub split_suggested: bool,
    pub commits: Vec<CommitSuggestion>,
}

impl GeneratePlan {
    /// Build the plan from a provider outcome, deduplicating file claims
    /// across commits. Returns the plan plus consolidation notes in
    /// `file -> "owning message"` form.
    pub fn from_outcome(outcome: &GenerateOutcome) -> (Self, Vec<String>) {
        if !outcome.split_suggested || outcome.commits.len() < 2 {
            return (
                Self {
                    split_suggested: false,
                    commits: outcome.commits.clone(),
                },
                Vec::new(),
            );
        }

        let DedupResult { commits, notes } = dedup_commits(outcome.commits.clone());
        let split_suggested = commits.len() > 1;
        (Self { split_suggested, commits }, notes)
    }
}
