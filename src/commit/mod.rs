//! Commit messages from staged changes, reviewed before anything is committed.

pub mod changeset;
pub mod diff;
pub mod message;
pub mod review;
pub mod summary;
pub mod workflow;

pub use changeset::ChangeSet;
pub use diff::{MAX_DIFF_LENGTH, StagedChanges, collect_changes, collect_diff_text};
pub use message::{CommitMessage, MessageOrigin, compose};
pub use review::{Decision, ReviewLoop, ReviewPrompt, TerminalPrompt};
pub use summary::SummaryRequester;
pub use workflow::{PushReport, PushWorkflow};
