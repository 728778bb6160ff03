//! jarvis - Commit messages and a chat console backed by a language model.
//!
//! # Overview
//!
//! The `push` binary stages everything, classifies the staged changes, asks
//! the model for a summary, and commits and pushes once the user accepts the
//! composed message. The `jarvis` binary sends a single prompt, echoes the
//! streamed reply, and repaints any fenced code as highlighted panels.

pub mod cancel;
pub mod chat;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;

use tracing_subscriber::EnvFilter;

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use chat::{ChatSession, SyntectHighlighter, TerminalSize};
pub use commit::{ChangeSet, CommitMessage, PushReport, PushWorkflow, SummaryRequester, compose};
pub use config::InferenceConfig;
pub use error::{ChatError, CommitError, ConfigError, GitError, InferenceError, RenderError};
pub use git::{DiffFilter, GitRepository, VersionControl};
pub use llm::{InferenceClient, OpenAiClient};

/// Environment variable holding the log filter, e.g. `JARVIS_LOG=debug`.
pub const LOG_ENV_VAR: &str = "JARVIS_LOG";

/// Exit status used when the user interrupts a run.
pub const EXIT_CANCELLED: u8 = 130;

/// Send `tracing` output to stderr, filtered by `JARVIS_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
