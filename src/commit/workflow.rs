//! The `push` pipeline: stage, classify, compose, review, commit, push.

use tracing::{info, warn};

use crate::cancel::CancellationToken;
use crate::commit::changeset::ChangeSet;
use crate::commit::diff::{collect_changes, collect_diff_text};
use crate::commit::message::{CommitMessage, compose};
use crate::commit::review::{ReviewLoop, ReviewPrompt};
use crate::commit::summary::SummaryRequester;
use crate::error::{CommitError, GitError};
use crate::git::VersionControl;

/// What happened after the commit was created.
#[derive(Debug)]
pub struct PushReport {
    /// The exact committed message.
    pub message: String,
    /// Branch the push targeted, when it could be resolved.
    pub branch: Option<String>,
    /// Push outcome. A failure here leaves a valid local commit behind.
    pub push: Result<(), GitError>,
}

impl PushReport {
    pub fn pushed(&self) -> bool {
        self.push.is_ok()
    }
}

/// Collaborators for one run of the commit workflow.
///
/// Without a summarizer, multi-change messages are headed by a change count
/// instead of a model summary.
pub struct PushWorkflow<'a> {
    vcs: &'a dyn VersionControl,
    summarizer: Option<&'a SummaryRequester>,
    prompt: &'a dyn ReviewPrompt,
}

impl<'a> PushWorkflow<'a> {
    pub fn new(
        vcs: &'a dyn VersionControl,
        summarizer: Option<&'a SummaryRequester>,
        prompt: &'a dyn ReviewPrompt,
    ) -> Self {
        Self {
            vcs,
            summarizer,
            prompt,
        }
    }

    /// Run the workflow once.
    ///
    /// An `override_message` is committed verbatim without review or summary.
    /// Nothing is committed when the staged change set is empty, when the
    /// user rejects a message that cannot be regenerated, or on cancellation.
    pub async fn run(
        &self,
        override_message: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<PushReport, CommitError> {
        cancel.check()?;
        if !cancel.run(self.vcs.is_repo()).await? {
            return Err(GitError::NotARepository.into());
        }

        cancel.run(self.vcs.add_all()).await??;
        let staged = collect_changes(self.vcs, cancel).await?;

        if staged.changes.is_empty() {
            return Err(CommitError::NothingToCommit);
        }
        info!("{} staged change(s)", staged.changes.total());

        let message = match override_message {
            Some(text) => compose(&staged.changes, None, Some(text)),
            None => {
                let diff = match self.summarizer {
                    Some(_) if staged.changes.single().is_none() => {
                        Some(collect_diff_text(self.vcs, staged.base, cancel).await?)
                    }
                    _ => None,
                };
                self.reviewed_message(&staged.changes, diff.as_deref(), cancel)
                    .await?
            }
        };

        cancel.run(self.vcs.commit(message.as_str())).await??;
        println!("Committed.");

        let branch = match cancel.run(self.vcs.current_branch()).await? {
            Ok(branch) => branch,
            Err(e) => {
                warn!("Could not resolve branch to push: {}", e);
                return Ok(PushReport {
                    message: message.as_str().to_string(),
                    branch: None,
                    push: Err(e),
                });
            }
        };

        println!("Pushing to {}...", branch);
        let push = cancel.run(self.vcs.push(&branch)).await?;
        if let Err(ref e) = push {
            warn!("Push failed: {}", e);
        }

        Ok(PushReport {
            message: message.as_str().to_string(),
            branch: Some(branch),
            push,
        })
    }

    /// Compose and review. `diff` is present only when a summary is wanted;
    /// the same diff backs every regeneration round.
    async fn reviewed_message(
        &self,
        changes: &ChangeSet,
        diff: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CommitMessage, CommitError> {
        let review = ReviewLoop::new(self.prompt, cancel);

        match (self.summarizer, diff) {
            (Some(summarizer), Some(diff)) => {
                let first = summarized(summarizer, changes, diff, cancel).await?;
                review
                    .run(first, move || summarized(summarizer, changes, diff, cancel))
                    .await
            }
            _ => {
                let first = compose(changes, None, None);
                review
                    .run(first, || std::future::ready(Err(CommitError::Aborted)))
                    .await
            }
        }
    }
}

async fn summarized(
    summarizer: &SummaryRequester,
    changes: &ChangeSet,
    diff: &str,
    cancel: &CancellationToken,
) -> Result<CommitMessage, CommitError> {
    println!("Summarizing {} changes...", changes.total());
    let summary = summarizer.request(diff, cancel).await?;
    Ok(compose(changes, Some(&summary), None))
}
