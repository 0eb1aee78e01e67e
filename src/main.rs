//! temno - CLI entry point.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use temno::config::Config;
use temno::generate::{RunOptions, run_generate};
use temno::provider::ProviderKind;

/// Generate commit messages from staged changes with optional splitting.
#[derive(Parser, Debug)]
#[command(name = "temno")]
#[command(about = "AI-assisted commit messages that can split staged changes into clean commits")]
#[command(version)]
struct Cli {
    /// AI backend to use
    #[arg(long, value_enum)]
    provider: Option<ProviderArg>,

    /// Model identifier passed to the backend CLI
    #[arg(long)]
    model: Option<String>,

    /// Generation timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Additional sensitive-path glob to exclude (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    exclude: Vec<String>,

    /// Never offer to split, even when the AI suggests it
    #[arg(long)]
    no_split: bool,

    /// Print the suggestion without touching the index or commit message
    #[arg(long)]
    dry_run: bool,

    /// Repository to operate on (any path inside it)
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ProviderArg {
    Claude,
    Codex,
}

impl From<ProviderArg> for ProviderKind {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::Claude => ProviderKind::Claude,
            ProviderArg::Codex => ProviderKind::Codex,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose { "temno=debug" } else { "temno=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Environment first, then flags on top
    let mut config = Config::from_env();
    if let Some(provider) = cli.provider {
        config.provider = provider.into();
    }
    if let Some(model) = cli.model {
        config.model = Some(model);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    config.exclude_patterns.extend(cli.exclude);

    run_generate(
        config,
        RunOptions {
            repo_path: cli.repo,
            no_split: cli.no_split,
            dry_run: cli.dry_run,
        },
    )
    .await
}
