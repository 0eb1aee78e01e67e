//! AI provider backends for commit message generation.
//!
//! Each backend drives an external CLI (`claude`, `codex`) as a subprocess.
//! Providers share one executor abstraction so retry, timeout, and
//! cancellation behave identically regardless of backend, and so tests can
//! substitute the subprocess entirely.

pub mod claude;
pub mod codex;
pub mod prompt;
pub mod retry;

pub use claude::ClaudeProvider;
pub use codex::CodexProvider;
pub use prompt::{DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT, DIFF_PLACEHOLDER, build_prompt};

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::plan::GenerateOutcome;

/// Which AI backend to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    Codex,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Codex => "codex",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request knobs resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    pub timeout_ms: u64,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// A backend that can turn a staged diff into commit suggestions.
#[async_trait]
pub trait CommitProvider: Send + Sync {
    /// Display name for progress and error messages.
    fn name(&self) -> &'static str;

    /// Shown when the backing CLI is missing.
    fn install_hint(&self) -> &'static str;

    /// Whether the backing CLI is installed and responsive.
    async fn is_available(&self) -> bool;

    /// Generate commit suggestions for `diff`. Never fails on malformed
    /// model output; that degrades inside the returned outcome.
    async fn generate(
        &self,
        diff: &str,
        options: &GenerateOptions,
        cancel: &CancelToken,
    ) -> Result<GenerateOutcome, ProviderError>;
}

/// Construct the configured backend.
pub fn create_provider(kind: ProviderKind, model: Option<&str>) -> Box<dyn CommitProvider> {
    match kind {
        ProviderKind::Claude => Box::new(ClaudeProvider::new(model)),
        ProviderKind::Codex => Box::new(CodexProvider::new(model)),
    }
}

/// Trait for executing a provider CLI call.
///
/// This abstraction allows mocking the subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderExecutor: Send + Sync {
    /// Run the CLI with the given prompt and return raw stdout.
    async fn run(
        &self,
        prompt: &str,
        timeout_ms: u64,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError>;
}

/// Run a prepared command with a deadline and cooperative cancellation.
///
/// The child is killed if the caller cancels or the deadline passes, so an
/// abandoned generation never leaves a CLI running in the background.
pub(crate) async fn run_with_deadline(
    mut cmd: Command,
    timeout_ms: u64,
    cancel: &CancelToken,
) -> Result<String, ProviderError> {
    if cancel.is_cancelled() {
        return Err(ProviderError::Cancelled);
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped()).kill_on_drop(true);

    let output = tokio::select! {
        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        result = timeout(Duration::from_millis(timeout_ms), cmd.output()) => result
            .map_err(|_| ProviderError::Timeout(timeout_ms))?
            .map_err(ProviderError::SpawnFailed)?,
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ProviderError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Check that a CLI binary exists on PATH and answers `--version`.
///
/// Uses the `which` crate for cross-platform executable detection.
pub(crate) async fn check_cli_available(binary: &str) -> bool {
    if which::which(binary).is_err() {
        return false;
    }

    match Command::new(binary).arg("--version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
