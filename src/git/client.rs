//! The version-control collaborator contract.

use std::fmt;

use async_trait::async_trait;

use crate::error::GitError;

/// Category a staged path is classified under.
///
/// The declaration order is the order sections appear in a composed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiffFilter {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl DiffFilter {
    /// Every category, in section order.
    pub const ALL: [DiffFilter; 4] = [
        DiffFilter::Added,
        DiffFilter::Modified,
        DiffFilter::Deleted,
        DiffFilter::Renamed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiffFilter::Added => "Added",
            DiffFilter::Modified => "Modified",
            DiffFilter::Deleted => "Deleted",
            DiffFilter::Renamed => "Renamed",
        }
    }
}

impl fmt::Display for DiffFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the index is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffBase {
    /// The tree of the current HEAD commit.
    Head,
    /// Nothing; used before the first commit exists.
    Empty,
}

/// Operations the commit workflow needs from version control.
///
/// This abstraction allows the workflow to be exercised without a real
/// repository or remote.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Whether the working directory is inside a non-bare repository.
    async fn is_repo(&self) -> bool;

    /// Whether HEAD points at a commit (false on an unborn branch).
    async fn has_head_commit(&self) -> Result<bool, GitError>;

    /// Staged paths in one category, in the order the diff reports them.
    async fn staged_name_only(
        &self,
        filter: DiffFilter,
        base: DiffBase,
    ) -> Result<Vec<String>, GitError>;

    /// Unified diff of the index against `base`.
    async fn diff_text(&self, base: DiffBase) -> Result<String, GitError>;

    /// Stage everything in the working tree (`git add -A`).
    async fn add_all(&self) -> Result<(), GitError>;

    /// Create a commit whose message is exactly `message`.
    async fn commit(&self, message: &str) -> Result<(), GitError>;

    async fn current_branch(&self) -> Result<String, GitError>;

    async fn push(&self, branch: &str) -> Result<(), GitError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diff_filter_display() {
        assert_eq!(DiffFilter::Added.to_string(), "Added");
        assert_eq!(DiffFilter::Modified.to_string(), "Modified");
        assert_eq!(DiffFilter::Deleted.to_string(), "Deleted");
        assert_eq!(DiffFilter::Renamed.to_string(), "Renamed");
    }

    #[test]
    fn test_diff_filter_section_order() {
        let mut shuffled = vec![
            DiffFilter::Renamed,
            DiffFilter::Added,
            DiffFilter::Deleted,
            DiffFilter::Modified,
        ];
        shuffled.sort();
        assert_eq!(shuffled, DiffFilter::ALL.to_vec());
    }
}
