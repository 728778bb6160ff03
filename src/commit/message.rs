//! Commit message composition.

use crate::commit::changeset::ChangeSet;

/// Indentation for paths listed under a category header.
const PATH_INDENT: &str = "  ";

/// What a [`CommitMessage`] was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Text supplied by the user on the command line.
    Override,
    /// Exactly one staged change; the message names it.
    SingleChange,
    /// A model summary heading the per-category listing.
    Summary(String),
    /// A change count heading the per-category listing (no model involved).
    Counted,
}

/// A composed commit message. Rebuilt from scratch on every regeneration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    text: String,
    origin: MessageOrigin,
}

impl CommitMessage {
    /// The exact bytes that will be committed.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn origin(&self) -> &MessageOrigin {
        &self.origin
    }

    /// Whether asking the model again could produce a different message.
    pub fn is_regenerable(&self) -> bool {
        matches!(self.origin, MessageOrigin::Summary(_))
    }
}

/// Compose the commit message for `changes`.
///
/// Pure: identical inputs always give identical output.
///
/// - An override is used verbatim; summary and changes are ignored.
/// - A single change gives `"<Verb> <path>"`.
/// - Otherwise the summary (or `"<total> changes:"` without one) is followed
///   by a blank line and one section per non-empty category, in the order
///   Added, Modified, Deleted, Renamed.
pub fn compose(
    changes: &ChangeSet,
    summary: Option<&str>,
    override_text: Option<&str>,
) -> CommitMessage {
    if let Some(text) = override_text {
        return CommitMessage {
            text: text.to_string(),
            origin: MessageOrigin::Override,
        };
    }

    if let Some((category, path)) = changes.single() {
        return CommitMessage {
            text: format!("{} {}", category, path.trim_start()),
            origin: MessageOrigin::SingleChange,
        };
    }

    let summary = summary.map(str::trim).filter(|s| !s.is_empty());
    let (header, origin) = match summary {
        Some(text) => (text.to_string(), MessageOrigin::Summary(text.to_string())),
        None => (format!("{} changes:", changes.total()), MessageOrigin::Counted),
    };

    let sections: Vec<String> = changes
        .non_empty()
        .map(|(category, paths)| {
            let mut lines = vec![format!("{} ({}):", category, paths.len())];
            lines.extend(paths.iter().map(|p| format!("{PATH_INDENT}{p}")));
            lines.join("\n")
        })
        .collect();

    let text = if sections.is_empty() {
        header
    } else {
        format!("{}\n\n{}", header, sections.join("\n\n"))
    };

    CommitMessage { text, origin }
}
