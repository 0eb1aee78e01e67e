//! User-facing progress output for split sessions.

use crate::plan::CommitSuggestion;
use crate::stage::StageOutcome;

/// Progress surface a split session reports through.
///
/// Implementations own whatever handles they allocate and release them in
/// [`SessionUi::dispose`], which the session calls exactly once on every
/// exit path.
#[cfg_attr(test, mockall::automock)]
pub trait SessionUi: Send + Sync {
    /// A commit's files are staged and its message is in place.
    fn step_ready(
        &self,
        index: usize,
        total: usize,
        commit: &CommitSuggestion,
        outcome: &StageOutcome,
    );

    /// Every commit in the plan has been handled.
    fn completed(&self, total: usize);

    /// The session ended before completing. Informational, not a failure.
    fn cancelled(&self, reason: &str);

    /// A non-fatal condition worth telling the user about.
    fn warn(&self, message: &str);

    /// Release any handles the UI holds.
    fn dispose(&self);
}

/// Prints session progress to the terminal. Holds no handles.
pub struct TerminalUi;

impl SessionUi for TerminalUi {
    fn step_ready(
        &self,
        index: usize,
        total: usize,
        commit: &CommitSuggestion,
        outcome: &StageOutcome,
    ) {
        println!();
        println!("Commit {} of {}: {}", index + 1, total, commit.message);
        for file in &outcome.staged {
            println!("  [STAGED] {}", file);
        }
        for file in &outcome.unmatched {
            println!("  [SKIP]   {} (not currently staged)", file);
        }
        if !outcome.unstaged.is_empty() {
            println!("  ({} other staged files set aside)", outcome.unstaged.len());
        }
        if !outcome.verified {
            self.warn("Staged files may not have settled yet; review before committing");
        }
        println!("Run `git commit` to record it; the message is prefilled.");
    }

    fn completed(&self, total: usize) {
        println!();
        println!("Split complete: all {} commits handled.", total);
    }

    fn cancelled(&self, reason: &str) {
        println!();
        println!("Split session ended: {}", reason);
    }

    fn warn(&self, message: &str) {
        eprintln!("\x1b[33m⚠ {}\x1b[0m", message);
    }

    fn dispose(&self) {}
}
