//! Codex CLI backend.

use std::io::Write;

use async_trait::async_trait;
use tempfile::NamedTempFile;
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

/// JSON schema for the commit response (used by `codex exec --output-schema`).
const COMMIT_RESPONSE_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "suggest_split": { "type": "boolean" },
    "commits": {
      "type": "array",
      "items": {
        "type": "object",
        "properties": {
          "message": { "type": "string" },
          "files": { "type": "array", "items": { "type": "string" } },
          "reasoning": { "type": "string" }
        },
        "required": ["message", "files", "reasoning"],
        "additionalProperties": false
      }
    }
  },
  "required": ["suggest_split", "commits"],
  "additionalProperties": false
}"#;

/// Executor that spawns the real `codex` CLI.
///
/// Writes the response schema to a temp file and runs
/// `codex exec --output-schema <file> [--model <m>] <prompt>`.
pub struct CodexCli {
    model: Option<String>,
}

#[async_trait]
impl ProviderExecutor for CodexCli {
    async fn run(
        &self,
        prompt: &str,
        timeout_ms: u64,
        cancel: &CancelToken,
    ) -> Result<String, ProviderError> {
        let mut schema_file = NamedTempFile::new().map_err(|e| {
            ProviderError::ExecutionFailed(format!("Failed to create schema file: {e}"))
        })?;
        schema_file.write_all(COMMIT_RESPONSE_SCHEMA.as_bytes()).map_err(|e| {
            ProviderError::ExecutionFailed(format!("Failed to write schema file: {e}"))
        })?;

        let mut cmd = Command::new("codex");
        cmd.arg("exec")
            .arg("--output-schema")
            .arg(schema_file.path());
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
        }
        cmd.arg(prompt);

        // schema_file stays alive until the child has exited
        run_with_deadline(cmd, timeout_ms, cancel).await
    }
}

/// Commit message generation backed by the Codex CLI.
pub struct CodexProvider<E = CodexCli> {
    executor: E,
}

impl CodexProvider {
    pub fn new(model: Option<&str>) -> Self {
        Self {
            executor: CodexCli {
                model: model.map(str::to_string),
            },
        }
    }
}

#[cfg(test)]
impl<E: ProviderExecutor> CodexProvider<E> {
    fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl<E: ProviderExecutor> CommitProvider for CodexProvider<E> {
    fn name(&self) -> &'static str {
        "Codex"
    }

    fn install_hint(&self) -> &'static str {
        "Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    }

    async fn is_available(&self) -> bool {
        check_cli_available("codex").await
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

        Ok(outcome_from_raw(&raw))
    }
}
