//! Repository access: index reads via git2, mutations via the git CLI.

pub mod git;
pub mod paths;

pub use git::GitWorkingTree;
pub use paths::{ResolvedPaths, is_valid_relative_path, normalize_separators, resolve_to_staged};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::RepoError;

/// A commit recorded in the repository while temno is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEvent {
    /// The new HEAD object id.
    pub oid: String,
}

/// The staging-area surface the workflow needs from a repository.
///
/// Reads reflect the index at call time; implementations must not serve
/// a snapshot taken before the latest mutation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkingTree: Send + Sync {
    /// Unified diff text: index vs HEAD when `staged`, otherwise working
    /// tree vs index including untracked files.
    async fn diff_text(&self, staged: bool) -> Result<String, RepoError>;

    /// Paths currently staged, repo-relative with forward slashes.
    async fn staged_paths(&self) -> Result<Vec<String>, RepoError>;

    /// Stage the given paths (`git add -- <paths>`). No-op for an empty list.
    async fn stage(&self, paths: &[String]) -> Result<(), RepoError>;

    /// Unstage the given paths (`git reset HEAD -- <paths>`), never the
    /// whole index. No-op for an empty list.
    async fn unstage(&self, paths: &[String]) -> Result<(), RepoError>;

    /// Replace the commit message `git commit` will offer next.
    async fn set_pending_message(&self, message: &str) -> Result<(), RepoError>;

    /// Subscribe to commits recorded from now on. A repository that cannot
    /// be watched returns a receiver that never fires.
    fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent>;
}
