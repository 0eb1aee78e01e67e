//! temno - AI-assisted commit messages that can split staged changes into clean commits.
//!
//! # Overview
//!
//! temno reads the staged diff, withholds sensitive files, asks a Claude or
//! Codex CLI for Conventional Commit messages, and either saves a single
//! message or walks the user through committing an AI-proposed split one
//! commit at a time.

pub mod cancel;
pub mod config;
pub mod diff;
pub mod error;
pub mod generate;
pub mod plan;
pub mod provider;
pub mod repo;
pub mod session;
pub mod stage;
pub mod ui;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::Config;
pub use error::{ProviderError, RepoError, SessionError, StageError};
pub use plan::{CommitSuggestion, GenerateOutcome, GeneratePlan};
pub use provider::{CommitProvider, GenerateOptions, ProviderKind};
pub use repo::{CommitEvent, GitWorkingTree, WorkingTree};
pub use session::{AdvanceOutcome, SessionManager};
pub use stage::{PollConfig, StageOutcome};
