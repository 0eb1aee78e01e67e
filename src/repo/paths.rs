//! Validation and resolution of AI-proposed file paths.
//!
//! Paths coming back from a model are untrusted input. Before any of them
//! reach a git command they are checked for traversal and absolute forms,
//! then resolved against the actual staged file list so only real staged
//! paths (in git's own spelling) are ever passed on.

use std::collections::HashMap;

/// Replace backslashes with forward slashes. Staged paths from git are
/// always slash-separated; AI output sometimes is not.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Whether `path` is a plausible repo-relative path: non-empty, no NUL,
/// not absolute, not drive-prefixed, and free of `..` segments.
pub fn is_valid_relative_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.contains('\0') {
        return false;
    }
    if path.starts_with('/') {
        return false;
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return false;
    }
    !normalize_separators(path).split('/').any(|segment| segment == "..")
}

/// Outcome of matching AI-proposed paths against the staged file list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedPaths {
    /// Proposed paths that match a staged file, in proposal order, spelled
    /// the way git reports them.
    pub matched: Vec<String>,
    /// Proposed paths with no staged counterpart.
    pub unmatched: Vec<String>,
}

/// Match each candidate against the staged set: exact match on normalized
/// separators first, then a case-insensitive fallback. Either way the
/// matched entry carries the staged spelling, never the candidate's.
pub fn resolve_to_staged(candidates: &[String], staged: &[String]) -> ResolvedPaths {
    let mut exact: HashMap<String, &str> = HashMap::new();
    let mut folded: HashMap<String, &str> = HashMap::new();
    for path in staged {
        let normalized = normalize_separators(path);
        exact.entry(normalized.clone()).or_insert(path.as_str());
        folded.entry(normalized.to_lowercase()).or_insert(path.as_str());
    }

    let mut resolved = ResolvedPaths::default();
    for candidate in candidates {
        let normalized = normalize_separators(candidate);
        if let Some(staged_spelling) = exact.get(&normalized) {
            resolved.matched.push((*staged_spelling).to_string());
        } else if let Some(staged_spelling) = folded.get(&normalized.to_lowercase()) {
            resolved.matched.push((*staged_spelling).to_string());
        } else {
            resolved.unmatched.push(candidate.clone());
        }
    }
    resolved
}
