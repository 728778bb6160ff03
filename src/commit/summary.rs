//! Diff summarization through the inference collaborator.

use std::sync::Arc;

use tracing::{debug, info};

use crate::cancel::CancellationToken;
use crate::error::{CommitError, ConfigError};
use crate::llm::InferenceClient;

/// Sends a diff with a fixed system instruction and returns the model's
/// plain-text summary.
pub struct SummaryRequester {
    client: Arc<dyn InferenceClient>,
    instruction: String,
}

impl SummaryRequester {
    /// Fails when the instruction text is blank; no request is ever made then.
    pub fn new(
        client: Arc<dyn InferenceClient>,
        instruction: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let instruction = instruction.into();
        if instruction.trim().is_empty() {
            return Err(ConfigError::EmptySystemPrompt("<instruction>".to_string()));
        }
        Ok(Self {
            client,
            instruction,
        })
    }

    /// Summarize `diff`. Each call is independent of earlier ones.
    pub async fn request(
        &self,
        diff: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CommitError> {
        cancel.check()?;
        info!("Requesting commit summary");
        debug!("Diff length: {} chars", diff.len());

        let summary = cancel
            .run(self.client.complete(&self.instruction, diff))
            .await??;

        Ok(summary.trim().to_string())
    }
}
