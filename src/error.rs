//! Error types for temno modules using thiserror.

use thiserror::Error;

/// Errors from repository access and mutation.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Not inside a git repository: {0}")]
    Discover(#[source] git2::Error),

    #[error("Repository has no working tree (bare repository)")]
    BareRepository,

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read the staged file list: {0}")]
    ReadIndex(#[source] git2::Error),

    #[error("Failed to spawn git {op}: {source}")]
    SpawnFailed {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("git {op} exited with code {code}: {stderr}")]
    GitCommand {
        op: &'static str,
        code: i32,
        stderr: String,
    },

    #[error("Failed to write the pending commit message: {0}")]
    MessageSlot(#[source] std::io::Error),
}

/// Errors from AI provider CLI operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{name} CLI not found. {hint}")]
    NotInstalled { name: &'static str, hint: &'static str },

    #[error("Failed to spawn provider process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Provider CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Generation timed out after {0} ms")]
    Timeout(u64),

    #[error("Generation failed: {0}")]
    ExecutionFailed(String),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ProviderError>),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed. Timeouts and cancellations
    /// are final; spawn failures and non-zero exits may be flaky CLI runs.
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self, Self::SpawnFailed(_) | Self::NonZeroExit { .. })
    }
}

/// Errors from staging orchestration.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("No valid file paths to stage")]
    NoValidPaths,

    #[error("None of the suggested files match currently staged changes")]
    NoStagedMatch,

    #[error("Failed to read staged files: {0}")]
    Snapshot(#[source] RepoError),

    #[error("Failed to update the staging area: {0}")]
    Mutation(#[source] RepoError),

    #[error("Staging cancelled")]
    Cancelled,
}

/// Errors from split-session management.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot start a split session without commits")]
    EmptyPlan,

    #[error("Failed to stage files for commit {step} of {total}: {source}")]
    StageStep {
        step: usize,
        total: usize,
        #[source]
        source: StageError,
    },

    #[error("Repository error during split session: {0}")]
    Repo(#[source] RepoError),
}
