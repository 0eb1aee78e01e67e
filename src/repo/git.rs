//! git2-backed working tree with CLI mutations and commit detection.
//!
//! Reads (diff, staged list) go through git2 and open the repository fresh
//! on every call, so they always see the current index. Mutations shell out
//! to the system `git` binary with argument arrays, inheriting the user's
//! hooks and config. Commit detection watches `.git` for HEAD movement.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::process::Command;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::RepoError;

use super::paths::normalize_separators;
use super::{CommitEvent, WorkingTree};

/// Capacity of the commit event channel. Commits are rare; a small buffer
/// only has to absorb bursts from scripted commit loops.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// A real repository on disk.
pub struct GitWorkingTree {
    root: PathBuf,
    git_dir: PathBuf,
    watcher: Mutex<Option<CommitWatcher>>,
}

impl GitWorkingTree {
    /// Discover the repository containing `path`.
    pub fn open(path: &Path) -> Result<Self, RepoError> {
        let repo = Repository::discover(path).map_err(RepoError::Discover)?;
        let root = repo
            .workdir()
            .ok_or(RepoError::BareRepository)?
            .to_path_buf();
        let git_dir = repo.path().to_path_buf();
        Ok(Self {
            root,
            git_dir,
            watcher: Mutex::new(None),
        })
    }

    /// Working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Open a fresh git2 handle. Never cached: the index must be re-read
    /// after every external mutation.
    fn repo(&self) -> Result<Repository, RepoError> {
        Repository::open(&self.root).map_err(RepoError::OpenRepository)
    }

    async fn exec_git(&self, mut cmd: Command, op: &'static str) -> Result<(), RepoError> {
        cmd.current_dir(&self.root)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| RepoError::SpawnFailed { op, source: e })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(RepoError::GitCommand { op, code, stderr });
        }
        Ok(())
    }
}

#[async_trait]
impl WorkingTree for GitWorkingTree {
    async fn diff_text(&self, staged: bool) -> Result<String, RepoError> {
        let repo = self.repo()?;
        let diff = if staged {
            let head_tree = resolve_head_tree(&repo)?;
            repo.diff_tree_to_index(head_tree.as_ref(), None, None)
                .map_err(RepoError::DiffFailed)?
        } else {
            let mut opts = DiffOptions::new();
            opts.include_untracked(true).recurse_untracked_dirs(true);
            repo.diff_index_to_workdir(None, Some(&mut opts))
                .map_err(RepoError::DiffFailed)?
        };
        render_patch(&diff)
    }

    async fn staged_paths(&self) -> Result<Vec<String>, RepoError> {
        let repo = self.repo()?;
        let head_tree = resolve_head_tree(&repo)?;
        let diff = repo
            .diff_tree_to_index(head_tree.as_ref(), None, None)
            .map_err(RepoError::ReadIndex)?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            let path = delta.new_file().path().or_else(|| delta.old_file().path());
            if let Some(p) = path {
                paths.push(normalize_separators(&p.to_string_lossy()));
            }
        }
        Ok(paths)
    }

    async fn stage(&self, paths: &[String]) -> Result<(), RepoError> {
        if paths.is_empty() {
            debug!("stage called with no paths");
            return Ok(());
        }
        let mut cmd = Command::new("git");
        cmd.arg("add").arg("--");
        for path in paths {
            cmd.arg(path);
        }
        self.exec_git(cmd, "add").await
    }

    async fn unstage(&self, paths: &[String]) -> Result<(), RepoError> {
        if paths.is_empty() {
            debug!("unstage called with no paths");
            return Ok(());
        }
        let mut cmd = Command::new("git");
        cmd.arg("reset").arg("HEAD").arg("--");
        for path in paths {
            cmd.arg(path);
        }
        self.exec_git(cmd, "reset").await
    }

    async fn set_pending_message(&self, message: &str) -> Result<(), RepoError> {
        let mut text = message.to_string();
        if !text.ends_with('\n') {
            text.push('\n');
        }
        tokio::fs::write(self.git_dir.join("MERGE_MSG"), text)
            .await
            .map_err(RepoError::MessageSlot)
    }

    /// Lazily starts the filesystem watcher on first call. Must be called
    /// from within a tokio runtime.
    fn subscribe_commits(&self) -> broadcast::Receiver<CommitEvent> {
        let mut guard = self.watcher.lock().expect("watcher lock poisoned");
        let watcher = guard
            .get_or_insert_with(|| CommitWatcher::spawn(self.root.clone(), self.git_dir.clone()));
        watcher.tx.subscribe()
    }
}

/// Resolve the HEAD tree, distinguishing empty-repo states from failures.
///
/// Returns `Ok(None)` for repos with no commits yet (unborn branch), so a
/// staged diff in a fresh repo is simply "everything in the index".
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, RepoError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(RepoError::DiffFailed(e)),
    };
    let tree = head_ref.peel_to_tree().map_err(RepoError::DiffFailed)?;
    Ok(Some(tree))
}

/// Render a diff as unified patch text, headers included.
fn render_patch(diff: &git2::Diff<'_>) -> Result<String, RepoError> {
    let mut text = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let content = std::str::from_utf8(line.content()).unwrap_or("");

        // Hunk lines carry their +/-/space marker separately from content.
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(content);
        true
    })
    .map_err(RepoError::DiffFailed)?;
    Ok(text)
}

/// Watches `.git` and broadcasts an event whenever HEAD moves to a new
/// commit. Created lazily and shut down when the working tree drops.
struct CommitWatcher {
    tx: broadcast::Sender<CommitEvent>,
    _watcher: Option<RecommendedWatcher>,
    task: Option<JoinHandle<()>>,
}

impl CommitWatcher {
    fn spawn(root: PathBuf, git_dir: PathBuf) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        match start_fs_watch(&git_dir) {
            Ok((watcher, fs_rx)) => {
                let task = tokio::spawn(relay_commits(root, tx.clone(), fs_rx));
                Self {
                    tx,
                    _watcher: Some(watcher),
                    task: Some(task),
                }
            }
            Err(e) => {
                warn!("Commit watcher unavailable ({e}); automatic advance is disabled");
                Self {
                    tx,
                    _watcher: None,
                    task: None,
                }
            }
        }
    }
}

impl Drop for CommitWatcher {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn start_fs_watch(
    git_dir: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<notify::Event>), notify::Error> {
    let (fs_tx, fs_rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |result: Result<notify::Event, notify::Error>| match result {
            Ok(event) => {
                let _ = fs_tx.send(event);
            }
            Err(e) => warn!("Repository watch error: {e}"),
        },
        notify::Config::default(),
    )?;
    watcher.watch(git_dir, RecursiveMode::Recursive)?;
    Ok((watcher, fs_rx))
}

/// Bridge filesystem events to commit events by re-reading HEAD and firing
/// only when its object id actually changed.
async fn relay_commits(
    root: PathBuf,
    tx: broadcast::Sender<CommitEvent>,
    mut fs_rx: mpsc::UnboundedReceiver<notify::Event>,
) {
    let mut last_head = read_head_oid(&root);
    while let Some(event) = fs_rx.recv().await {
        if !touches_head(&event) {
            continue;
        }
        let Some(oid) = read_head_oid(&root) else {
            continue;
        };
        if last_head.as_ref() == Some(&oid) {
            continue;
        }
        debug!(%oid, "Commit recorded");
        last_head = Some(oid.clone());
        let _ = tx.send(CommitEvent { oid });
    }
}

/// Cheap pre-filter: only ref updates can move HEAD, so object writes and
/// index churn are skipped without opening the repository.
fn touches_head(event: &notify::Event) -> bool {
    event.paths.iter().any(|path| {
        path.file_name()
            .is_some_and(|name| name == "HEAD" || name == "packed-refs")
            || path
                .components()
                .any(|c| c.as_os_str() == "refs" || c.as_os_str() == "logs")
    })
}

fn read_head_oid(root: &Path) -> Option<String> {
    let repo = Repository::open(root).ok()?;
    let head = repo.head().ok()?;
    head.target().map(|oid| oid.to_string())
}
