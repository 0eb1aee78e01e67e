//! Runtime configuration resolved from defaults, environment, then CLI flags.

use std::env;

use tracing::warn;

use crate::diff::DEFAULT_EXCLUDE_PATTERNS;
use crate::provider::{
    DEFAULT_SYSTEM_PROMPT, DEFAULT_USER_PROMPT, DIFF_PLACEHOLDER, GenerateOptions, ProviderKind,
};

/// Default generation timeout (30 seconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Environment variable to override the generation timeout (milliseconds).
const TIMEOUT_ENV_VAR: &str = "TEMNO_TIMEOUT_MS";

/// Environment variable carrying a custom system prompt.
const SYSTEM_PROMPT_ENV_VAR: &str = "TEMNO_SYSTEM_PROMPT";

/// Environment variable carrying a custom user prompt template.
const USER_PROMPT_ENV_VAR: &str = "TEMNO_USER_PROMPT";

/// Environment variable with extra exclusion globs, comma-separated.
const EXCLUDE_ENV_VAR: &str = "TEMNO_EXCLUDE";

/// Resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: ProviderKind,
    /// Model identifier handed to the backend CLI. `None` lets the backend
    /// pick its own default.
    pub model: Option<String>,
    pub timeout_ms: u64,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Sensitive-path globs. Defaults always apply; env and CLI add to them.
    pub exclude_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Claude,
            model: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            user_prompt: DEFAULT_USER_PROMPT.to_string(),
            exclude_patterns: DEFAULT_EXCLUDE_PATTERNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Build a config from defaults plus environment overrides.
    ///
    /// Invalid values never abort a run: they log a warning and fall back
    /// to the default for that setting.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.timeout_ms = env_timeout_ms();

        if let Some(prompt) = env_string(SYSTEM_PROMPT_ENV_VAR) {
            config.system_prompt = prompt;
        }
        if let Some(prompt) = env_string(USER_PROMPT_ENV_VAR) {
            if prompt.contains(DIFF_PLACEHOLDER) {
                config.user_prompt = prompt;
            } else {
                warn!(
                    "{USER_PROMPT_ENV_VAR} has no {DIFF_PLACEHOLDER} placeholder, using the default user prompt"
                );
            }
        }

        config.exclude_patterns.extend(env_exclude_patterns());
        config
    }

    /// Per-request options for the provider call.
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            timeout_ms: self.timeout_ms,
            system_prompt: self.system_prompt.clone(),
            user_prompt: self.user_prompt.clone(),
        }
    }
}

/// Read the timeout override, falling back to the default on anything
/// non-numeric. Mirrors the warn-and-default handling of the other vars.
fn env_timeout_ms() -> u64 {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(ms) => ms,
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}ms",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_MS
                );
                DEFAULT_TIMEOUT_MS
            }
        },
        _ => DEFAULT_TIMEOUT_MS,
    }
}

/// A trimmed, non-empty env string, or `None`.
fn env_string(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

/// Extra exclusion globs from the environment, comma-separated.
fn env_exclude_patterns() -> Vec<String> {
    let Some(raw) = env_string(EXCLUDE_ENV_VAR) else {
        return Vec::new();
    };
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
