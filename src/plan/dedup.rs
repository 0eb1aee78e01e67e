//! Removes duplicate file claims from a multi-commit plan.
//!
//! A file can only be staged for one commit of a split, so when several
//! suggested commits claim the same path, the earliest commit keeps it.
//! Matching is on normalized separators only; spelling is otherwise
//! preserved so the notes read the way the model wrote them.

use std::collections::HashMap;

use crate::repo::paths::normalize_separators;

use super::CommitSuggestion;

/// A deduplicated plan plus human-readable consolidation notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupResult {
    /// Commits with unique file claims. Commits left with no files are
    /// dropped entirely.
    pub commits: Vec<CommitSuggestion>,
    /// One `file -> "owning message"` line per removed duplicate.
    pub notes: Vec<String>,
}

/// First claim wins: later commits lose files already claimed by an
/// earlier commit (or earlier in the same commit).
pub fn dedup_commits(commits: Vec<CommitSuggestion>) -> DedupResult {
    let mut owner_by_file: HashMap<String, String> = HashMap::new();
    let mut kept = Vec::with_capacity(commits.len());
    let mut notes = Vec::new();

    for commit in commits {
        let mut files = Vec::with_capacity(commit.files.len());
        for file in commit.files {
            let key = normalize_separators(&file);
            match owner_by_file.get(&key) {
                Some(owner) => notes.push(format!("{file} -> \"{owner}\"")),
                None => {
                    owner_by_file.insert(key, commit.message.clone());
                    files.push(file);
                }
            }
        }
        if !files.is_empty() {
            kept.push(CommitSuggestion { files, ..commit });
        }
    }

    DedupResult { commits: kept, notes }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(message: &str, files: &[&str]) -> CommitSuggestion {
        CommitSuggestion {
            message: message.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
            reasoning: String::new(),
        }
    }

    #[test]
    fn disjoint_commits_are_untouched() {
        let result = dedup_commits(vec![
            suggestion("feat: a", &["src/a.rs"]),
            suggestion("feat: b", &["src/b.rs", "src/b_test.rs"]),
        ]);

        assert_eq!(result.commits.len(), 2);
        assert_eq!(result.commits[1].files, vec!["src/b.rs", "src/b_test.rs"]);
        assert!(result.notes.is_empty());
    }

    #[test]
    fn first_claim_wins_and_is_named_in_the_note() {
        let result = dedup_commits(vec![
            suggestion("feat: add config", &["src/config.rs", "src/lib.rs"]),
            suggestion("refactor: wiring", &["src/lib.rs", "src/main.rs"]),
        ]);

        assert_eq!(result.commits[0].files, vec!["src/config.rs", "src/lib.rs"]);
        assert_eq!(result.commits[1].files, vec!["src/main.rs"]);
        assert_eq!(result.notes, vec!["src/lib.rs -> \"feat: add config\""]);
    }

    #[test]
    fn commit_losing_all_files_is_dropped() {
        let result = dedup_commits(vec![
            suggestion("feat: everything", &["src/a.rs", "src/b.rs"]),
            suggestion("chore: leftovers", &["src/a.rs", "src/b.rs"]),
        ]);

        assert_eq!(result.commits.len(), 1);
        assert_eq!(result.commits[0].message, "feat: everything");
        assert_eq!(result.notes.len(), 2);
    }

    #[test]
    fn separator_style_does_not_defeat_dedup() {
        let result = dedup_commits(vec![
            suggestion("feat: a", &["src/app/main.rs"]),
            suggestion("feat: b", &["src\\app\\main.rs"]),
        ]);

        assert_eq!(result.commits.len(), 1);
        assert_eq!(result.notes, vec!["src\\app\\main.rs -> \"feat: a\""]);
    }

    #[test]
    fn duplicate_within_one_commit_is_also_removed() {
        let result = dedup_commits(vec![suggestion("feat: a", &["src/a.rs", "src/a.rs"])]);

        assert_eq!(result.commits[0].files, vec!["src/a.rs"]);
        assert_eq!(result.notes, vec!["src/a.rs -> \"feat: a\""]);
    }

    #[test]
    fn reasoning_survives_dedup() {
        let mut commit = suggestion("feat: a", &["src/a.rs"]);
        commit.reasoning = "core change".to_string();
        let result = dedup_commits(vec![commit]);

        assert_eq!(result.commits[0].reasoning, "core change");
    }
}
