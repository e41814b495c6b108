//! git::client
//!
//! The process-boundary capability trait.
//!
//! # Design
//!
//! [`GitClient`] is async because every operation may shell out to a
//! long-running external process. Implementations are stateless: the
//! working directory is a parameter on every call, so one shared client
//! serves every repository in the vault.
//!
//! The registry owns serialization. Implementations perform no locking of
//! their own; two concurrent calls against the same directory are the
//! caller's race to prevent.
//!
//! # Example
//!
//! ```ignore
//! use gitvault::git::{GitClient, CommandGitClient};
//! use std::path::Path;
//!
//! async fn show_branch(client: &dyn GitClient, repo: &Path) -> Result<(), gitvault::git::GitError> {
//!     let branch = client.current_branch(repo).await?;
//!     println!("on {branch}");
//!     Ok(())
//! }
//! ```

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::status::RawStatus;
use super::GitError;

/// A configured remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remote {
    /// Remote name (e.g. "origin").
    pub name: String,
    /// Fetch URL.
    pub url: String,
}

/// One commit in the history listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Full commit hash.
    pub full_hash: String,
    /// Abbreviated hash (7 characters).
    pub short_hash: String,
    /// Commit subject line.
    pub message: String,
    /// Author name.
    pub author_name: String,
    /// Author date.
    pub date: DateTime<FixedOffset>,
    /// Paths touched by this commit.
    pub changed_files: Vec<String>,
}

/// Discrete operations against one git working directory.
///
/// Implementations must be `Send + Sync`; the registry shares one client
/// across all repository instances and scheduler tasks.
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Whether the directory is inside a valid git repository.
    async fn is_repository(&self, path: &Path) -> bool;

    /// Initialize a new repository at the directory.
    async fn init(&self, path: &Path) -> Result<(), GitError>;

    /// Clone a repository from `url` into the directory.
    async fn clone_repo(&self, url: &str, path: &Path) -> Result<(), GitError>;

    /// Raw status: branch header, ahead/behind, per-path records.
    async fn status(&self, path: &Path) -> Result<RawStatus, GitError>;

    /// Stage the given repository-relative paths.
    async fn stage(&self, path: &Path, files: &[String]) -> Result<(), GitError>;

    /// Stage every change, including untracked files.
    async fn stage_all(&self, path: &Path) -> Result<(), GitError>;

    /// Remove the given paths from the index, keeping working-tree content.
    async fn unstage(&self, path: &Path, files: &[String]) -> Result<(), GitError>;

    /// Remove everything from the index, keeping working-tree content.
    async fn unstage_all(&self, path: &Path) -> Result<(), GitError>;

    /// Check the given paths out from HEAD, discarding working-tree edits.
    ///
    /// Irreversible: uncommitted content is destroyed. Confirmation is the
    /// caller's concern.
    async fn discard(&self, path: &Path, files: &[String]) -> Result<(), GitError>;

    /// Commit staged content, returning the new commit hash.
    ///
    /// # Errors
    ///
    /// [`GitError::NothingToCommit`] when the index holds no changes.
    async fn commit(&self, path: &Path, message: &str) -> Result<String, GitError>;

    /// Unified diff of one file; index-to-HEAD when `staged`, otherwise
    /// working-tree-to-index.
    async fn diff_file(&self, path: &Path, file: &str, staged: bool) -> Result<String, GitError>;

    /// Most-recent-first history, at most `limit` entries, with the files
    /// touched per commit.
    async fn log(&self, path: &Path, limit: usize) -> Result<Vec<LogEntry>, GitError>;

    /// Name of the currently checked-out branch.
    async fn current_branch(&self, path: &Path) -> Result<String, GitError>;

    /// All local branch names.
    async fn branches(&self, path: &Path) -> Result<Vec<String>, GitError>;

    /// Check out the given branch.
    async fn checkout(&self, path: &Path, branch: &str) -> Result<(), GitError>;

    /// List configured remotes with their fetch URLs.
    async fn remotes(&self, path: &Path) -> Result<Vec<Remote>, GitError>;

    /// Add a remote.
    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), GitError>;

    /// Whether the current branch has an upstream tracking branch.
    async fn has_upstream(&self, path: &Path) -> bool;

    /// Push to `remote`/`branch`, with `--set-upstream` when requested.
    async fn push(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
        set_upstream: bool,
    ) -> Result<(), GitError>;

    /// Pull from the configured upstream.
    async fn pull(&self, path: &Path) -> Result<(), GitError>;

    /// Authoritative ignore check for one repository-relative path.
    ///
    /// Any failure (including "not ignored") reads as `false`.
    async fn check_ignore(&self, path: &Path, file: &str) -> bool;

    /// Write a repository-local (never global) configuration entry.
    async fn set_local_config(&self, path: &Path, key: &str, value: &str)
        -> Result<(), GitError>;
}
