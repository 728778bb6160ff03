//! push - Commit and push staged work with a reviewed, model-written message.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use jarvis::commit::TerminalPrompt;
use jarvis::git::check_git_installed;
use jarvis::{
    CancellationToken, CommitError, GitRepository, InferenceConfig, OpenAiClient, PushWorkflow,
    SummaryRequester,
};

/// Stage everything, compose a commit message, and push once you accept it.
#[derive(Parser, Debug)]
#[command(name = "push")]
#[command(about = "Stage, commit and push with a reviewed commit message")]
#[command(version)]
struct Cli {
    /// Commit message to use verbatim (no summary, no review)
    message: Option<String>,

    /// Head multi-file messages with a change count instead of a model summary
    #[arg(long)]
    no_ai: bool,

    /// Model used for the summary (overrides JARVIS_MODEL)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    jarvis::init_logging();
    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    cancel.cancel_on_ctrl_c();

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_cancelled(&e) => {
            eprintln!("\nCancelled.");
            ExitCode::from(jarvis::EXIT_CANCELLED)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    check_git_installed()?;
    let workdir = std::env::current_dir().context("Failed to read the current directory")?;
    let repo = GitRepository::new(workdir);

    // Configuration problems must surface before anything is staged.
    let summarizer = if cli.message.is_none() && !cli.no_ai {
        let config = InferenceConfig::from_env(cli.model.as_deref())?;
        let client = Arc::new(OpenAiClient::new(&config));
        Some(SummaryRequester::new(client, config.system_prompt)?)
    } else {
        None
    };

    let prompt = TerminalPrompt;
    let report = PushWorkflow::new(&repo, summarizer.as_ref(), &prompt)
        .run(cli.message.as_deref(), cancel)
        .await?;

    match (&report.push, &report.branch) {
        (Ok(()), Some(branch)) => println!("Pushed to {}.", branch),
        (Ok(()), None) => println!("Pushed."),
        (Err(e), branch) => {
            eprintln!("Warning: the commit was created but the push failed: {}", e);
            match branch {
                Some(branch) => eprintln!("Push it manually with: git push origin {}", branch),
                None => eprintln!("Push it manually with: git push"),
            }
        }
    }

    Ok(())
}

fn is_cancelled(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<CommitError>(), Some(CommitError::Cancelled))
}
