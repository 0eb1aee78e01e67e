//! Split-session state machine.
//!
//! Drives the "stage all, one commit at a time" workflow: stage the first
//! commit's files, wait for the user to record it (advancing automatically
//! when a commit lands, or on a manual trigger), then stage the next. At
//! most one session is active per manager; starting a new one supersedes
//! the old, and every exit path releases the session's resources once.

use std::sync::Arc;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{SessionError, StageError};
use crate::plan::CommitSuggestion;
use crate::repo::{CommitEvent, WorkingTree};
use crate::stage::{PollConfig, stage_additional, stage_for_commit};
use crate::ui::SessionUi;

/// Result of starting a session or advancing it by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The commit at `index` has its files staged and its message pending.
    Staged { index: usize, total: usize },
    /// The last commit was handled; the session is over.
    Completed,
    /// The session was cancelled while staging.
    Cancelled,
    /// No session is active.
    NoSession,
}

struct ActiveSession {
    commits: Vec<CommitSuggestion>,
    index: usize,
    cancel: CancelToken,
    auto_advance: Option<JoinHandle<()>>,
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        if let Some(task) = self.auto_advance.take() {
            task.abort();
        }
    }
}

/// Owns the one split session that may be active at a time.
///
/// The slot lock is held across every staging mutation, so two logical
/// operations can never mutate the index concurrently. Cancellation goes
/// through a separate cell so it can interrupt an operation that is
/// holding the slot.
pub struct SessionManager {
    repo: Arc<dyn WorkingTree>,
    ui: Arc<dyn SessionUi>,
    poll: PollConfig,
    slot: Mutex<Option<ActiveSession>>,
    cancel_cell: std::sync::Mutex<Option<CancelToken>>,
}

impl SessionManager {
    pub fn new(repo: Arc<dyn WorkingTree>, ui: Arc<dyn SessionUi>, poll: PollConfig) -> Arc<Self> {
        Arc::new(Self {
            repo,
            ui,
            poll,
            slot: Mutex::new(None),
            cancel_cell: std::sync::Mutex::new(None),
        })
    }

    /// Start a session for `commits`, superseding any active one.
    ///
    /// Stages the first commit's files and sets its message before
    /// returning. Failures are announced through the UI before they are
    /// returned, so callers only need to stop, not report.
    pub async fn start(
        self: &Arc<Self>,
        commits: Vec<CommitSuggestion>,
    ) -> Result<AdvanceOutcome, SessionError> {
        if commits.is_empty() {
            return Err(SessionError::EmptyPlan);
        }

        let mut slot = self.slot.lock().await;
        if let Some(old) = slot.take() {
            debug!("Superseding split session at step {}", old.index + 1);
            self.finish(old);
            self.ui.cancelled("superseded by a new run");
            self.ui.dispose();
        }

        let cancel = CancelToken::new();
        *self.cancel_cell.lock().expect("cancel cell poisoned") = Some(cancel.clone());

        let total = commits.len();
        let mut session = ActiveSession {
            commits,
            index: 0,
            cancel: cancel.clone(),
            auto_advance: None,
        };

        let outcome =
            match stage_for_commit(self.repo.as_ref(), &session.commits[0].files, &cancel, &self.poll)
                .await
            {
                Ok(outcome) => outcome,
                Err(StageError::Cancelled) => {
                    self.finish(session);
                    self.ui.cancelled("cancelled");
                    self.ui.dispose();
                    return Ok(AdvanceOutcome::Cancelled);
                }
                Err(e) => {
                    let err = SessionError::StageStep {
                        step: 1,
                        total,
                        source: e,
                    };
                    self.finish(session);
                    self.ui.cancelled(&err.to_string());
                    self.ui.dispose();
                    return Err(err);
                }
            };

        // The message slot is written only after staging settled, so the
        // user can never commit before the index matches the plan.
        if let Err(e) = self.repo.set_pending_message(&session.commits[0].message).await {
            let err = SessionError::Repo(e);
            self.finish(session);
            self.ui.cancelled(&err.to_string());
            self.ui.dispose();
            return Err(err);
        }

        self.ui.step_ready(0, total, &session.commits[0], &outcome);

        let events = self.repo.subscribe_commits();
        session.auto_advance = Some(tokio::spawn(auto_advance_loop(
            Arc::clone(self),
            events,
            cancel,
        )));
        *slot = Some(session);

        Ok(AdvanceOutcome::Staged { index: 0, total })
    }

    /// Move to the next commit in the plan.
    ///
    /// Called by the auto-advance task when a commit lands, or directly
    /// for a manual advance. Holding the slot lock across the staging
    /// mutation is what keeps concurrent advances out of the index.
    pub async fn advance(self: &Arc<Self>) -> Result<AdvanceOutcome, SessionError> {
        let mut slot = self.slot.lock().await;
        let Some(mut session) = slot.take() else {
            return Ok(AdvanceOutcome::NoSession);
        };

        session.index += 1;
        let total = session.commits.len();
        if session.index >= total {
            self.finish(session);
            self.ui.completed(total);
            self.ui.dispose();
            return Ok(AdvanceOutcome::Completed);
        }

        let index = session.index;
        let commit = session.commits[index].clone();
        let cancel = session.cancel.clone();

        match stage_additional(self.repo.as_ref(), &commit.files, &cancel, &self.poll).await {
            Ok(outcome) => {
                if let Err(e) = self.repo.set_pending_message(&commit.message).await {
                    let err = SessionError::Repo(e);
                    self.finish(session);
                    self.ui.cancelled(&err.to_string());
                    self.ui.dispose();
                    return Err(err);
                }
                self.ui.step_ready(index, total, &commit, &outcome);
                *slot = Some(session);
                Ok(AdvanceOutcome::Staged { index, total })
            }
            Err(StageError::Cancelled) => {
                self.finish(session);
                self.ui.cancelled("cancelled");
                self.ui.dispose();
                Ok(AdvanceOutcome::Cancelled)
            }
            Err(e) => {
                let err = SessionError::StageStep {
                    step: index + 1,
                    total,
                    source: e,
                };
                self.finish(session);
                self.ui.cancelled(&err.to_string());
                self.ui.dispose();
                Err(err)
            }
        }
    }

    /// Cancel any active session. Safe to call repeatedly or with none
    /// active; the cancel signal fires before the slot is touched so an
    /// in-flight staging poll unwinds promptly.
    pub async fn cancel(&self, reason: &str) {
        let token = self
            .cancel_cell
            .lock()
            .expect("cancel cell poisoned")
            .clone();
        if let Some(token) = token {
            token.cancel();
        }

        let mut slot = self.slot.lock().await;
        if let Some(session) = slot.take() {
            self.finish(session);
            self.ui.cancelled(reason);
            self.ui.dispose();
        }
    }

    pub async fn is_active(&self) -> bool {
        self.slot.lock().await.is_some()
    }

    /// Zero-based step index and plan size of the active session.
    pub async fn current_step(&self) -> Option<(usize, usize)> {
        self.slot
            .lock()
            .await
            .as_ref()
            .map(|s| (s.index, s.commits.len()))
    }

    /// Stop the session's machinery without announcing anything.
    fn finish(&self, mut session: ActiveSession) {
        session.cancel.cancel();
        if let Some(task) = session.auto_advance.take() {
            task.abort();
        }
        *self.cancel_cell.lock().expect("cancel cell poisoned") = None;
    }
}

/// Background task that advances the session each time a commit lands.
async fn auto_advance_loop(
    manager: Arc<SessionManager>,
    mut events: broadcast::Receiver<CommitEvent>,
    cancel: CancelToken,
) {
    loop {
        let proceed = tokio::select! {
            _ = cancel.cancelled() => false,
            event = events.recv() => match event {
                Ok(event) => {
                    debug!("Commit {} recorded, advancing split session", event.oid);
                    true
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} commit notifications, advancing once");
                    true
                }
                Err(broadcast::error::RecvError::Closed) => false,
            },
        };
        if !proceed {
            break;
        }

        match manager.advance().await {
            Ok(AdvanceOutcome::Staged { .. }) => {}
            Ok(_) => break,
            Err(e) => {
                debug!("Split session ended after staging failure: {e}");
                break;
            }
        }
    }
}
