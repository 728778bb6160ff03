//! Accept/reject review of a composed commit message.

use std::future::Future;

use async_trait::async_trait;
use dialoguer::Confirm;
use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::commit::message::CommitMessage;
use crate::error::{Cancelled, CommitError};

/// The user's answer to a presented message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

/// Presents a message and collects a decision.
///
/// This abstraction allows the review loop to be driven without a terminal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewPrompt: Send + Sync {
    async fn ask(&self, message: &str) -> Result<Decision, CommitError>;
}

/// Interactive prompt on the controlling terminal. Enter accepts.
pub struct TerminalPrompt;

#[async_trait]
impl ReviewPrompt for TerminalPrompt {
    async fn ask(&self, message: &str) -> Result<Decision, CommitError> {
        let message = message.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            print_preview(&message);
            Confirm::new()
                .with_prompt("Commit and push with this message?")
                .default(true)
                .interact()
        })
        .await
        .map_err(|e| CommitError::Prompt(e.to_string()))?;

        match answer {
            Ok(true) => Ok(Decision::Accept),
            Ok(false) => Ok(Decision::Reject),
            Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => {
                Err(CommitError::Cancelled)
            }
            Err(e) => Err(CommitError::Prompt(e.to_string())),
        }
    }
}

fn print_preview(message: &str) {
    let rule = "─".repeat(60);
    println!();
    println!("Commit message:");
    println!("{rule}");
    println!("{message}");
    println!("{rule}");
}

/// States of a review. `Accepted` and `Cancelled` are terminal.
#[derive(Debug)]
enum ReviewState {
    Presented(CommitMessage),
    Rejected,
    Accepted(CommitMessage),
    Cancelled,
}

/// Drives the present → decide → regenerate cycle until a message is
/// accepted, the user aborts, or the run is cancelled.
pub struct ReviewLoop<'a> {
    prompt: &'a dyn ReviewPrompt,
    cancel: &'a CancellationToken,
}

impl<'a> ReviewLoop<'a> {
    pub fn new(prompt: &'a dyn ReviewPrompt, cancel: &'a CancellationToken) -> Self {
        Self { prompt, cancel }
    }

    /// Review `first`, calling `regenerate` for a fresh message after every
    /// rejection. No bound on the number of rounds; each one discards the
    /// previous message.
    ///
    /// Rejecting a message that cannot change on regeneration (an override,
    /// a single-change or counted message) ends with [`CommitError::Aborted`].
    pub async fn run<F, Fut>(
        &self,
        first: CommitMessage,
        mut regenerate: F,
    ) -> Result<CommitMessage, CommitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<CommitMessage, CommitError>>,
    {
        let mut state = ReviewState::Presented(first);
        let mut rounds = 0usize;

        loop {
            state = match state {
                ReviewState::Presented(message) => {
                    match self.cancel.run(self.prompt.ask(message.as_str())).await {
                        Err(Cancelled) | Ok(Err(CommitError::Cancelled)) => ReviewState::Cancelled,
                        Ok(Err(e)) => return Err(e),
                        Ok(Ok(Decision::Accept)) => ReviewState::Accepted(message),
                        Ok(Ok(Decision::Reject)) if message.is_regenerable() => {
                            ReviewState::Rejected
                        }
                        Ok(Ok(Decision::Reject)) => return Err(CommitError::Aborted),
                    }
                }
                ReviewState::Rejected => {
                    rounds += 1;
                    info!("Regenerating commit message (round {})", rounds);
                    match regenerate().await {
                        Ok(message) => ReviewState::Presented(message),
                        Err(CommitError::Cancelled) => ReviewState::Cancelled,
                        Err(e) => return Err(e),
                    }
                }
                ReviewState::Accepted(message) => {
                    debug!("Message accepted after {} regeneration(s)", rounds);
                    return Ok(message);
                }
                ReviewState::Cancelled => return Err(CommitError::Cancelled),
            };
        }
    }
}
