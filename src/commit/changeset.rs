//! Classified snapshot of the staged changes.

use std::collections::BTreeMap;

use crate::git::DiffFilter;

/// Staged paths by category, in the order the diff reported them.
///
/// Built once per workflow run and never mutated; counts are always derived
/// from the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: Vec<String>,
    modified: Vec<String>,
    deleted: Vec<String>,
    renamed: Vec<String>,
}

impl ChangeSet {
    pub fn new(
        added: Vec<String>,
        modified: Vec<String>,
        deleted: Vec<String>,
        renamed: Vec<String>,
    ) -> Self {
        Self {
            added,
            modified,
            deleted,
            renamed,
        }
    }

    pub fn paths(&self, category: DiffFilter) -> &[String] {
        match category {
            DiffFilter::Added => &self.added,
            DiffFilter::Modified => &self.modified,
            DiffFilter::Deleted => &self.deleted,
            DiffFilter::Renamed => &self.renamed,
        }
    }

    pub fn count(&self, category: DiffFilter) -> usize {
        self.paths(category).len()
    }

    pub fn counts(&self) -> BTreeMap<DiffFilter, usize> {
        DiffFilter::ALL
            .iter()
            .map(|&category| (category, self.count(category)))
            .collect()
    }

    pub fn total(&self) -> usize {
        DiffFilter::ALL.iter().map(|&c| self.count(c)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Categories with at least one path, in section order.
    pub fn non_empty(&self) -> impl Iterator<Item = (DiffFilter, &[String])> {
        DiffFilter::ALL
            .into_iter()
            .map(|category| (category, self.paths(category)))
            .filter(|(_, paths)| !paths.is_empty())
    }

    /// The category and path when exactly one change is staged.
    pub fn single(&self) -> Option<(DiffFilter, &str)> {
        if self.total() != 1 {
            return None;
        }
        self.non_empty()
            .next()
            .and_then(|(category, paths)| paths.first().map(|p| (category, p.as_str())))
    }
}
