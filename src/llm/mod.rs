//! Language model access: the collaborator trait and an OpenAI-compatible client.

pub mod client;
pub mod openai;

pub use client::{InferenceClient, TextStream};
pub use openai::OpenAiClient;

#[cfg(test)]
pub use client::MockInferenceClient;
