//! Version control: the collaborator trait and its git implementation.

pub mod client;
pub mod repository;

pub use client::{DiffBase, DiffFilter, VersionControl};
pub use repository::{GitRepository, MESSAGE_FILE_PREFIX, check_git_installed};

#[cfg(test)]
pub use client::MockVersionControl;
