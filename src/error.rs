//! Error types for jarvis modules using thiserror.

use thiserror::Error;

/// Missing or unusable configuration, detected before any side effect.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No API key found. Set the OPENAI_API_KEY environment variable")]
    MissingApiKey,

    #[error("System prompt not found at {0}. Create it or point JARVIS_SYSTEM_PROMPT at a readable file")]
    MissingSystemPrompt(String),

    #[error("Failed to read system prompt {path}: {source}")]
    UnreadableSystemPrompt {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("System prompt at {0} is empty")]
    EmptySystemPrompt(String),

    #[error("Could not determine the configuration directory; set JARVIS_SYSTEM_PROMPT")]
    NoConfigDirectory,
}

/// Errors from the version-control collaborator.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository. Run this from within a git repository.")]
    NotARepository,

    #[error("Failed to open repository: {0}")]
    OpenRepository(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to resolve current branch: {0}")]
    BranchFailed(String),

    #[error("Failed to write commit message file: {0}")]
    MessageFile(#[source] std::io::Error),

    #[error("git is not installed or not on PATH")]
    NotInstalled,

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },
}

/// Errors from the inference collaborator.
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Request to the model provider failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Model provider responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model provider returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error("Model provider returned an empty response")]
    EmptyResponse,

    #[error("Response stream failed: {0}")]
    Stream(#[source] reqwest::Error),

    #[error("Model provider did not respond within {}s", .0.as_secs())]
    Timeout(std::time::Duration),
}

/// Errors from the commit workflow.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("No changes to commit (nothing staged after git add)")]
    NothingToCommit,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Failed to generate a summary: {0}")]
    Summary(#[from] InferenceError),

    #[error("Review prompt failed: {0}")]
    Prompt(String),

    #[error("Commit aborted")]
    Aborted,

    #[error("Cancelled")]
    Cancelled,
}

/// Errors from the chat workflow.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Failed to write to terminal: {0}")]
    Terminal(#[from] std::io::Error),

    #[error("Cancelled")]
    Cancelled,
}

/// Highlighting or panel rendering failures. Always recovered inside `chat`.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No syntax definition for language '{0}'")]
    UnknownLanguage(String),

    #[error("Highlighting failed: {0}")]
    Highlight(String),
}

/// Marker returned when a [`crate::cancel::CancellationToken`] fires.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Cancelled")]
pub struct Cancelled;

impl From<Cancelled> for CommitError {
    fn from(_: Cancelled) -> Self {
        CommitError::Cancelled
    }
}

impl From<Cancelled> for ChatError {
    fn from(_: Cancelled) -> Self {
        ChatError::Cancelled
    }
}
