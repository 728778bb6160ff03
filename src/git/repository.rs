//! [`VersionControl`] backed by git2 for reads and the system `git` binary
//! for writes.
//!
//! `add`, `commit` and `push` shell out so they inherit the user's hooks,
//! git config, SSH agent and credential store.

use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use git2::{Delta, Diff, DiffFindOptions, DiffFormat, ErrorCode, Repository};
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;
use crate::git::client::{DiffBase, DiffFilter, VersionControl};

/// Prefix of the transient commit message file written inside `.git/`.
pub const MESSAGE_FILE_PREFIX: &str = "JARVIS_COMMIT_MSG_";

const DEFAULT_REMOTE: &str = "origin";

/// Check that the `git` executable is available.
pub fn check_git_installed() -> Result<(), GitError> {
    which::which("git").map(|_| ()).map_err(|_| GitError::NotInstalled)
}

/// A repository rooted at (or above) a working directory.
pub struct GitRepository {
    workdir: PathBuf,
}

impl GitRepository {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn open(&self) -> Result<Repository, GitError> {
        Repository::discover(&self.workdir).map_err(|e| {
            if e.code() == ErrorCode::NotFound {
                GitError::NotARepository
            } else {
                GitError::OpenRepository(e)
            }
        })
    }

    /// Run a git command in the working directory and return its stdout.
    ///
    /// The child is killed if the returned future is dropped, so a cancelled
    /// push does not linger.
    async fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    GitError::NotInstalled
                } else {
                    GitError::SpawnFailed {
                        operation: operation.to_string(),
                        source,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::CommandFailed {
                operation: operation.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Diff the index against `base`, with rename detection enabled.
fn staged_diff(repo: &Repository, base: DiffBase) -> Result<Diff<'_>, GitError> {
    let tree = match base {
        DiffBase::Head => Some(
            repo.head()
                .and_then(|head| head.peel_to_tree())
                .map_err(GitError::DiffFailed)?,
        ),
        DiffBase::Empty => None,
    };

    let mut diff = repo
        .diff_tree_to_index(tree.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;

    let mut find = DiffFindOptions::new();
    find.renames(true);
    diff.find_similar(Some(&mut find))
        .map_err(GitError::DiffFailed)?;

    Ok(diff)
}

fn classify(status: Delta) -> Option<DiffFilter> {
    match status {
        Delta::Added | Delta::Copied => Some(DiffFilter::Added),
        Delta::Modified | Delta::Typechange => Some(DiffFilter::Modified),
        Delta::Deleted => Some(DiffFilter::Deleted),
        Delta::Renamed => Some(DiffFilter::Renamed),
        _ => None,
    }
}

#[async_trait]
impl VersionControl for GitRepository {
    async fn is_repo(&self) -> bool {
        self.open().map(|repo| !repo.is_bare()).unwrap_or(false)
    }

    async fn has_head_commit(&self) -> Result<bool, GitError> {
        let repo = self.open()?;
        match repo.head() {
            Ok(head) => Ok(head.peel_to_commit().is_ok()),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(false)
            }
            Err(e) => Err(GitError::DiffFailed(e)),
        }
    }

    async fn staged_name_only(
        &self,
        filter: DiffFilter,
        base: DiffBase,
    ) -> Result<Vec<String>, GitError> {
        let repo = self.open()?;
        let diff = staged_diff(&repo, base)?;

        let paths = diff
            .deltas()
            .filter(|delta| classify(delta.status()) == Some(filter))
            .filter_map(|delta| {
                // Deleted files only have an old side.
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().to_string())
            })
            .filter(|path| !path.is_empty())
            .collect();

        Ok(paths)
    }

    async fn diff_text(&self, base: DiffBase) -> Result<String, GitError> {
        let repo = self.open()?;
        let diff = staged_diff(&repo, base)?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let origin = line.origin();
            if origin == '+' || origin == '-' || origin == ' ' {
                text.push(origin);
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })
        .map_err(GitError::DiffFailed)?;

        Ok(text)
    }

    async fn add_all(&self) -> Result<(), GitError> {
        self.run_git(&["add", "-A"], "add").await.map(|_| ())
    }

    async fn commit(&self, message: &str) -> Result<(), GitError> {
        let git_dir = self.open()?.path().to_path_buf();

        // Removed when dropped: on success, on error, and when this future is
        // dropped by cancellation.
        let mut file = tempfile::Builder::new()
            .prefix(MESSAGE_FILE_PREFIX)
            .suffix(".txt")
            .tempfile_in(&git_dir)
            .map_err(GitError::MessageFile)?;
        file.write_all(message.as_bytes())
            .and_then(|_| file.flush())
            .map_err(GitError::MessageFile)?;

        let path = file.path().to_string_lossy().to_string();
        self.run_git(&["commit", "--cleanup=verbatim", "-F", &path], "commit")
            .await
            .map(|_| ())
    }

    async fn current_branch(&self) -> Result<String, GitError> {
        let repo = self.open()?;
        let head = repo
            .head()
            .map_err(|e| GitError::BranchFailed(e.message().to_string()))?;

        if !head.is_branch() {
            return Err(GitError::BranchFailed("HEAD is detached".to_string()));
        }

        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| GitError::BranchFailed("branch name is not valid UTF-8".to_string()))
    }

    async fn push(&self, branch: &str) -> Result<(), GitError> {
        self.run_git(&["push", DEFAULT_REMOTE, branch], "push")
            .await
            .map(|_| ())
    }
}
