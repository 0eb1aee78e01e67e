//! Claude Code CLI backend.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::cancel::CancelToken;
use crate::error::ProviderError;
use crate::plan::GenerateOutcome;
use crate::plan::parse::outcome_from_raw;

use super::retry::retry_transient;
use super::{
    CommitProvider, GenerateOptions, ProviderExecutor, build_prompt, check_cli_available,
    run_with_deadline,
};

/// Model alias used when the user does not pick one.
const DEFAULT_MODEL: &str = "haiku";

/// Executor that spawns the real `claude` CLI.
///
/// Uses the -p flag for the prompt and --output-format json, which wraps
/// the reply in a `{result, is_error}` envelope.
pub struct ClaudeCli {
    model: String,
}

#[async_trait]
impl ProviderExecutor for ClaudeCli {
    async fn run(
        &self,
        prompt: &str,
        timeout_ms: u64,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError> {
        let mut cmd = Command::new("claude");
        cmd.arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .arg("--model")
            .arg(&self.model);

        run_with_deadline(cmd, timeout_ms, cancel).await
    }
}

/// Claude CLI JSON envelope when using --output-format json.
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope. Output that is not an envelope is passed
/// through untouched, since some CLI versions print the reply bare.
fn unwrap_envelope(raw: &str) -> Result<String, ProviderError> {
    match serde_json::from_str::<ClaudeCliResponse>(raw) {
        Ok(envelope) if envelope.is_error => Err(ProviderError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(_) => Ok(raw.to_string()),
    }
}

/// Commit message generation backed by the Claude Code CLI.
pub struct ClaudeProvider<E = ClaudeCli> {
    executor: E,
}

impl ClaudeProvider {
    pub fn new(model: Option<&str>) -> Self {
        Self {
            executor: ClaudeCli {
                model: model.unwrap_or(DEFAULT_MODEL).to_string(),
            },
        }
    }
}

#[cfg(test)]
impl<E: ProviderExecutor> ClaudeProvider<E> {
    fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<E: ProviderExecutor> CommitProvider for ClaudeProvider<E> {
    fn name(&self) -> &'static str {
        "Claude"
    }

    fn install_hint(&self) -> &'static str {
        "Install with: npm install -g @anthropic-ai/claude-code"
    }

    async fn is_available(&self) -> bool {
        check_cli_available("claude").await
    }

    async fn generate(
        &self,
        diff: &str,
        options: &GenerateOptions,
        cancel: &CancelToken,
    ) -> Result<GenerateOutcome, ProviderError> {
        let prompt = build_prompt(options, diff);
        let raw = retry_transient(cancel, || async {
            self.executor.run(&prompt, options.timeout_ms, cancel).await
        })
        .await?;

        let content = unwrap_envelope(&raw)?;
        Ok(outcome_from_raw(&content))
    }
}
