//! Staged change collection through the version-control collaborator.

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::commit::changeset::ChangeSet;
use crate::error::CommitError;
use crate::git::{DiffBase, DiffFilter, VersionControl};

/// Maximum characters of unified diff sent for summarization.
pub const MAX_DIFF_LENGTH: usize = 30_000;

/// The classified changes plus the base they were diffed against, so the
/// unified diff can later be taken against the same base.
#[derive(Debug, Clone)]
pub struct StagedChanges {
    pub changes: ChangeSet,
    pub base: DiffBase,
}

/// Classify the staged changes.
///
/// Diffs against HEAD when a commit exists, otherwise against nothing (the
/// initial-commit case). Any collaborator failure aborts the run.
pub async fn collect_changes<V>(
    vcs: &V,
    cancel: &CancellationToken,
) -> Result<StagedChanges, CommitError>
where
    V: VersionControl + ?Sized,
{
    cancel.check()?;
    let base = if cancel.run(vcs.has_head_commit()).await?? {
        DiffBase::Head
    } else {
        DiffBase::Empty
    };

    let added = staged_list(vcs, DiffFilter::Added, base, cancel).await?;
    let modified = staged_list(vcs, DiffFilter::Modified, base, cancel).await?;
    let deleted = staged_list(vcs, DiffFilter::Deleted, base, cancel).await?;
    let renamed = staged_list(vcs, DiffFilter::Renamed, base, cancel).await?;
    let changes = ChangeSet::new(added, modified, deleted, renamed);

    debug!(
        base = ?base,
        total = changes.total(),
        "collected staged changes"
    );

    Ok(StagedChanges { changes, base })
}

async fn staged_list<V>(
    vcs: &V,
    filter: DiffFilter,
    base: DiffBase,
    cancel: &CancellationToken,
) -> Result<Vec<String>, CommitError>
where
    V: VersionControl + ?Sized,
{
    Ok(cancel.run(vcs.staged_name_only(filter, base)).await??)
}

/// Unified diff for the summary request, truncated to [`MAX_DIFF_LENGTH`].
pub async fn collect_diff_text<V>(
    vcs: &V,
    base: DiffBase,
    cancel: &CancellationToken,
) -> Result<String, CommitError>
where
    V: VersionControl + ?Sized,
{
    let text = cancel.run(vcs.diff_text(base)).await??;
    Ok(truncate_diff(&text, MAX_DIFF_LENGTH))
}

/// Cut `text` to at most `max` bytes on a line boundary, noting the cut.
pub fn truncate_diff(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }

    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let cut = text[..end].rfind('\n').map(|i| i + 1).unwrap_or(end);

    let mut truncated = text[..cut].to_string();
    truncated.push_str("\n[diff truncated; summarize the visible changes]\n");
    truncated
}
