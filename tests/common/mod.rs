//! Shared test utilities for integration tests.
//!
//! Not all helpers are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};
use tokio::sync::broadcast;

use temno::plan::CommitSuggestion;
use temno::repo::{CommitEvent, WorkingTree};
use temno::stage::StageOutcome;
use temno::ui::SessionUi;
use temno::RepoError;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file under the working tree, creating parent directories.
    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
    }

    /// Write a file and add it to the index.
    pub fn stage_file(&self, rel: &str, content: &str) {
        self.write_file(rel, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_path(Path::new(rel))
            .expect("Failed to add file to index");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is currently staged. Returns the commit OID.
    pub fn commit_staged(&self, message: &str) -> Oid {
        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }
}

#[derive(Default)]
struct FakeState {
    staged: BTreeSet<String>,
    /// Pre-mutation view served for the next `lag_reads` reads, to
    /// exercise the readiness poll.
    stale_view: BTreeSet<String>,
    lag_reads: u32,
    /// Lag to arm on the next mutation.
    armed_lag: u32,
    mutations: Vec<String>,
    pending_message: Option<String>,
}

/// In-memory [`WorkingTree`] with a scripted staged set.
///
/// Mutations apply immediately, but `set_lag` can make a bounded number
/// of subsequent reads return the pre-mutation view, the way an external
/// observer of the index lags behind a filesystem-level change.
pub struct FakeWorkingTree {
    state: Mutex<FakeState>,
    commits: broadcast::Sender<CommitEvent>,
}

impl FakeWorkingTree {
    pub fn with_staged(files: &[&str]) -> Self {
        let (commits, _keep) = broadcast::channel(16);
        let state = FakeState {
            staged: files.iter().map(|s| s.to_string()).collect(),
            ..FakeState::default()
        };
        Self {
            state: Mutex::new(state),
            commits,
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    /// Serve the pre-mutation staged view for `reads` reads after the
    /// next mutation.
    pub fn set_lag(&self, reads: u32) {
        self.state().armed_lag = reads;
    }

    pub fn staged_now(&self) -> Vec<String> {
        self.state().staged.iter().cloned().collect()
    }

    pub fn pending_message(&self) -> Option<String> {
        self.state().pending_message.clone()
    }

    /// Mutation log, one entry per stage/unstage call.
    pub fn mutations(&self) -> Vec<String> {
        self.state().mutations.clone()
    }

    /// Simulate the user running `git commit`: the staged set empties
    /// and subscribers hear about the new commit.
    pub fn record_commit(&self, oid: &str) {
        self.state().staged.clear();
        let _ = self.commits.send(CommitEvent {
            oid: oid.to_string(),
        });
    }

    fn before_mutation(state: &mut FakeState) {
        if state.armed_lag > 0 {
            state.stale_view = state.staged.clone();
            state.lag_reads = state.armed_lag;
            state.armed_lag = 0;
        }
    }
}

#[async_trait]
impl WorkingTree for FakeWorkingTree {
    async fn diff_text(&self, _staged: bool) -> Result<String, RepoError> {
        let state = self.state();
        let mut diff = String::new();
        for file in &state.staged {
            diff.push_str(&format!(
                "diff --git a/{file} b/{file}\n--- a/{file}\n+++ b/{file}\n@@ -0,0 +1 @@\n+content\n"
            ));
        }
        Ok(diff)
    }

    async fn staged_paths(&self) -> Result<Vec<String>, RepoError> {
        let mut state = self.state();
        if state.lag_reads > 0 {
            state.lag_reads -= 1;
            return Ok(state.stale_view.iter().cloned().collect());
        }
        Ok(state.staged.iter().cloned().collect())
    }

    async fn stage(&self, paths: &[String]) -> Result<(), RepoError> {
        let mut state = self.state();
        Self::before_mutation(&mut state);
        state.mutations.push(format!("stage {}", paths.join(",")));
        for path in paths {
            state.staged.insert(path.clone());
        }
        Ok(())
    }

    async fn unstage(&self, paths: &[String]) -> Result<(), RepoError> {
        let mut state = self.state();
        Self::before_mutation(&mut state);
        state.mutations.push(format!("unstage {}", paths.join(",")));
        for path in paths {
            state.staged.remove(path);
        }
        Ok(())
    }

    async fn set_pending_message(&self, message: &str) -> Result<(), RepoError> {
        self.state().pending_message = Some(message.to_string());
        Ok(())
    }

    fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent> {
        self.commits.subscribe()
    }
}

/// [`SessionUi`] that records every call for later assertions.
#[derive(Default)]
pub struct RecordingUi {
    events: Mutex<Vec<String>>,
}

impl RecordingUi {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events poisoned").clone()
    }

    fn push(&self, event: String) {
        self.events.lock().expect("events poisoned").push(event);
    }
}

impl SessionUi for RecordingUi {
    fn step_ready(
        &self,
        index: usize,
        total: usize,
        commit: &CommitSuggestion,
        outcome: &StageOutcome,
    ) {
        let verified = if outcome.verified { "" } else { " unverified" };
        self.push(format!(
            "step {}/{}: {}{}",
            index + 1,
            total,
            commit.message,
            verified
        ));
    }

    fn completed(&self, total: usize) {
        self.push(format!("completed {}", total));
    }

    fn cancelled(&self, reason: &str) {
        self.push(format!("cancelled: {}", reason));
    }

    fn warn(&self, message: &str) {
        self.push(format!("warn: {}", message));
    }

    fn dispose(&self) {
        self.push("dispose".to_string());
    }
}

/// Build a suggestion without ceremony.
pub fn suggestion(message: &str, files: &[&str]) -> CommitSuggestion {
    CommitSuggestion {
        message: message.to_string(),
        files: files.iter().map(|s| s.to_string()).collect(),
        reasoning: String::new(),
    }
}
