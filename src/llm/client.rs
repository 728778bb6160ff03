//! The inference collaborator contract.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::error::InferenceError;

/// Text fragments in arrival order. Ends when the provider closes the stream.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, InferenceError>> + Send>>;

/// A chat-style language model.
///
/// This abstraction allows mocking the provider in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send a system instruction and a user prompt; return the full reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, InferenceError>;

    /// Same exchange, but the reply arrives as a stream of fragments.
    async fn stream(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<TextStream, InferenceError>;
}
