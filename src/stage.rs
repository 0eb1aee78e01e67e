//! Staging orchestration for commit plans.
//!
//! Translates an AI-proposed file list into index mutations: a selective
//! unstage for the first commit of a plan, a forward add for later ones.
//! After every mutation the staged view is polled until it matches the
//! expected set, because observers of the index can lag a mutation.

use std::collections::HashSet;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::StageError;
use crate::repo::{WorkingTree, is_valid_relative_path, normalize_separators, resolve_to_staged};

/// Bounded retry schedule for the staged-view readiness poll.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval: Duration::from_millis(100),
        }
    }
}

/// What a staging operation did to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    /// Files meant to be staged once the operation settles, spelled the
    /// way git reports them.
    pub staged: Vec<String>,
    /// Files removed from the index by a selective unstage.
    pub unstaged: Vec<String>,
    /// Suggested paths with no staged counterpart, dropped with a warning.
    pub unmatched: Vec<String>,
    /// Whether the readiness poll confirmed the staged view.
    pub verified: bool,
}

/// Stage exactly `files` for the next commit by unstaging everything else.
///
/// Files that are already staged are left untouched, which preserves any
/// partial-hunk staging the user set up and avoids index churn for entries
/// that are already correct. Fails when no suggested path survives
/// validation, or when none of the valid paths match a staged file.
pub async fn stage_for_commit(
    repo: &dyn WorkingTree,
    files: &[String],
    cancel: &CancelToken,
    poll: &PollConfig,
) -> Result<StageOutcome, StageError> {
    let candidates = validated(files);
    if candidates.is_empty() {
        return Err(StageError::NoValidPaths);
    }

    let staged = repo.staged_paths().await.map_err(StageError::Snapshot)?;
    let resolved = resolve_to_staged(&candidates, &staged);
    for path in &resolved.unmatched {
        warn!("Suggested file is not staged, skipping: {path}");
    }
    if resolved.matched.is_empty() {
        return Err(StageError::NoStagedMatch);
    }

    let keep: HashSet<&str> = resolved.matched.iter().map(String::as_str).collect();
    let complement: Vec<String> = staged
        .iter()
        .filter(|path| !keep.contains(path.as_str()))
        .cloned()
        .collect();

    if complement.is_empty() {
        debug!("Staged set already matches the plan, no index mutation needed");
        return Ok(StageOutcome {
            staged: resolved.matched,
            unstaged: Vec::new(),
            unmatched: resolved.unmatched,
            verified: true,
        });
    }

    repo.unstage(&complement).await.map_err(StageError::Mutation)?;
    let verified = await_staged_exactly(repo, &resolved.matched, cancel, poll).await?;

    Ok(StageOutcome {
        staged: resolved.matched,
        unstaged: complement,
        unmatched: resolved.unmatched,
        verified,
    })
}

/// Stage previously-unstaged `files` for a later commit in a split plan.
///
/// The first commit's selective unstage left these files out of the index,
/// so a plain forward add is enough.
pub async fn stage_additional(
    repo: &dyn WorkingTree,
    files: &[String],
    cancel: &CancelToken,
    poll: &PollConfig,
) -> Result<StageOutcome, StageError> {
    let candidates = validated(files);
    if candidates.is_empty() {
        return Err(StageError::NoValidPaths);
    }

    repo.stage(&candidates).await.map_err(StageError::Mutation)?;
    let verified = await_staged_exactly(repo, &candidates, cancel, poll).await?;

    Ok(StageOutcome {
        staged: candidates,
        unstaged: Vec::new(),
        unmatched: Vec::new(),
        verified,
    })
}

/// Poll the staged view until it contains exactly `expected`.
///
/// The first read happens immediately; further reads are spaced by
/// `poll.interval`. Returns `Ok(false)` once the attempts are exhausted,
/// leaving the caller to proceed with whatever state the last mutation
/// produced rather than blocking forever.
pub async fn await_staged_exactly(
    repo: &dyn WorkingTree,
    expected: &[String],
    cancel: &CancelToken,
    poll: &PollConfig,
) -> Result<bool, StageError> {
    let want: HashSet<&str> = expected.iter().map(String::as_str).collect();
    let mut backoff = Constant::new(poll.interval);

    for attempt in 1..=poll.attempts {
        match repo.staged_paths().await {
            Ok(staged) => {
                let have: HashSet<&str> = staged.iter().map(String::as_str).collect();
                if have == want {
                    debug!("Staged view settled after {attempt} read(s)");
                    return Ok(true);
                }
            }
            Err(e) => warn!("Could not read staged files while verifying: {e}"),
        }

        if attempt < poll.attempts {
            if let Some(delay) = backoff.next_backoff() {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(StageError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    warn!(
        "Staged view did not settle after {} attempts, proceeding anyway",
        poll.attempts
    );
    Ok(false)
}

/// Validation gate for AI-supplied paths before any of them reach the
/// index or a process argument. Invalid entries are dropped with a
/// warning; survivors are normalized and deduplicated in order.
fn validated(files: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut valid = Vec::new();
    for file in files {
        if !is_valid_relative_path(file) {
            warn!("Dropping invalid suggested path: {file:?}");
            continue;
        }
        let normalized = normalize_separators(file);
        if seen.insert(normalized.clone()) {
            valid.push(normalized);
        }
    }
    valid
}
