//! Top-level generate workflow: staged diff in, commit messages out.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use dialoguer::Select;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::diff::filter_sensitive;
use crate::error::{ProviderError, StageError};
use crate::plan::{CommitSuggestion, GenerateOutcome, GeneratePlan};
use crate::provider::create_provider;
use crate::repo::{GitWorkingTree, WorkingTree};
use crate::session::{AdvanceOutcome, SessionManager};
use crate::stage::{PollConfig, stage_for_commit};
use crate::ui::{SessionUi, TerminalUi};

/// Flags from the command line that shape a single run.
pub struct RunOptions {
    /// Any path inside the repository to operate on.
    pub repo_path: PathBuf,
    /// Never offer to split, even when the AI suggests it.
    pub no_split: bool,
    /// Print the suggestion without touching the index or message slot.
    pub dry_run: bool,
}

pub async fn run_generate(config: Config, options: RunOptions) -> Result<()> {
    let repo = GitWorkingTree::open(&options.repo_path)?;
    let repo: Arc<dyn WorkingTree> = Arc::new(repo);

    let diff = repo.diff_text(true).await?;
    if diff.trim().is_empty() {
        println!("No staged changes. Stage files with `git add` first.");
        return Ok(());
    }

    let filtered = filter_sensitive(&diff, &config.exclude_patterns);
    if !filtered.excluded_files.is_empty() {
        eprintln!(
            "\x1b[33m⚠ Excluded {} sensitive file(s) from the request: {}\x1b[0m",
            filtered.excluded_files.len(),
            filtered.excluded_files.join(", ")
        );
    }
    if filtered.total_sections == 0 {
        bail!("Staged diff has no recognizable file sections");
    }
    if filtered.filtered_diff.trim().is_empty() {
        bail!("All staged changes match exclusion patterns; nothing to send");
    }

    let provider = create_provider(config.provider, config.model.as_deref());
    if !provider.is_available().await {
        return Err(ProviderError::NotInstalled {
            name: provider.name(),
            hint: provider.install_hint(),
        }
        .into());
    }

    let cancel = CancelToken::new();
    let ui: Arc<dyn SessionUi> = Arc::new(TerminalUi);
    let manager = SessionManager::new(Arc::clone(&repo), ui, PollConfig::default());

    {
        let cancel = cancel.clone();
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
                manager.cancel("cancelled").await;
            }
        });
    }

    println!("Generating commit message with {}...", provider.name());
    let outcome = match provider
        .generate(&filtered.filtered_diff, &config.generate_options(), &cancel)
        .await
    {
        Ok(outcome) => outcome,
        Err(ProviderError::Cancelled) => {
            println!("Generation cancelled.");
            return Ok(());
        }
        Err(e @ ProviderError::Timeout(_)) => {
            return Err(anyhow::Error::new(e)
                .context("Generation timed out. Try a smaller diff or raise TEMNO_TIMEOUT_MS"));
        }
        Err(e) => return Err(e).context("Generation failed"),
    };

    let (plan, notes) = GeneratePlan::from_outcome(&outcome);
    if !notes.is_empty() {
        println!("Consolidated duplicate file assignments:");
        for note in &notes {
            println!("  {}", note);
        }
    }

    if options.dry_run {
        print_plan_preview(&outcome, &plan);
        return Ok(());
    }

    if options.no_split || !plan.split_suggested {
        return finish_single(repo.as_ref(), &outcome.message).await;
    }

    println!(
        "\nThe staged changes look like {} separate commits:",
        plan.commits.len()
    );
    for (i, commit) in plan.commits.iter().enumerate() {
        println!(
            "  {}. {} ({} files)",
            i + 1,
            commit.message,
            commit.files.len()
        );
    }
    println!();

    let choice = Select::new()
        .with_prompt("How do you want to commit?")
        .items(&[
            "Stage and commit one at a time",
            "Stage only one of the suggested commits",
            "Keep a single combined commit",
        ])
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?;

    match choice {
        Some(0) => run_split_session(&manager, plan.commits, &cancel).await,
        Some(1) => pick_one_commit(repo.as_ref(), &plan.commits, &cancel).await,
        Some(2) => finish_single(repo.as_ref(), &outcome.message).await,
        _ => {
            println!("Cancelled.");
            Ok(())
        }
    }
}

/// Save a single combined message and tell the user how to use it.
async fn finish_single(repo: &dyn WorkingTree, message: &str) -> Result<()> {
    println!("\n{}\n", message);
    repo.set_pending_message(message)
        .await
        .context("Failed to save the commit message")?;
    println!("Message saved. Run `git commit` to use it.");
    Ok(())
}

/// Stage one suggested commit and set its message, leaving the other
/// suggestions' files unstaged.
async fn pick_one_commit(
    repo: &dyn WorkingTree,
    commits: &[CommitSuggestion],
    cancel: &CancelToken,
) -> Result<()> {
    let items: Vec<String> = commits
        .iter()
        .map(|c| format!("{} ({} files)", c.message, c.files.len()))
        .collect();
    let Some(choice) = Select::new()
        .with_prompt("Which commit do you want to stage?")
        .items(&items)
        .default(0)
        .interact_opt()
        .context("Failed to read selection")?
    else {
        println!("Cancelled.");
        return Ok(());
    };

    let commit = &commits[choice];
    let outcome = match stage_for_commit(repo, &commit.files, cancel, &PollConfig::default()).await
    {
        Ok(outcome) => outcome,
        Err(StageError::Cancelled) => {
            println!("Cancelled.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    repo.set_pending_message(&commit.message)
        .await
        .context("Failed to save the commit message")?;

    println!(
        "\nStaged {} file(s) for: {}",
        outcome.staged.len(),
        commit.message
    );
    if !outcome.unstaged.is_empty() {
        println!(
            "Set aside {} other staged file(s); they stay in your working tree.",
            outcome.unstaged.len()
        );
    }
    if !outcome.verified {
        TerminalUi.warn("Staged files may not have settled yet; review before committing");
    }
    println!("Run `git commit` to record it; the message is prefilled.");
    Ok(())
}

/// Drive a full split session until it completes or ends early.
///
/// The session announces its own progress and failures through the UI;
/// this loop only watches the lifecycle and feeds manual advances from
/// stdin.
async fn run_split_session(
    manager: &Arc<SessionManager>,
    commits: Vec<CommitSuggestion>,
    cancel: &CancelToken,
) -> Result<()> {
    if manager.start(commits).await? == AdvanceOutcome::Cancelled {
        return Ok(());
    }

    println!("\nPress Enter after each commit to advance manually (Ctrl-C to stop).");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !manager.is_active().await {
                    break;
                }
            }
            line = lines.next_line() => match line {
                Ok(Some(_)) => match manager.advance().await {
                    Ok(AdvanceOutcome::Staged { .. }) => {}
                    Ok(_) => break,
                    Err(e) => {
                        debug!("Manual advance ended the session: {e}");
                        break;
                    }
                },
                Ok(None) | Err(_) => break,
            },
        }
    }
    Ok(())
}

fn print_plan_preview(outcome: &GenerateOutcome, plan: &GeneratePlan) {
    println!("\n--- Dry Run Output ---\n");
    println!("{}", outcome.message);
    if plan.split_suggested {
        println!("\nSuggested split into {} commits:", plan.commits.len());
        for (i, commit) in plan.commits.iter().enumerate() {
            println!("\n{}. {}", i + 1, commit.message);
            for file in &commit.files {
                println!("   {}", file);
            }
            if !commit.reasoning.is_empty() {
                println!("   ({})", commit.reasoning);
            }
        }
    }
}
