//! git
//!
//! The single doorway to the external version-control process.
//!
//! # Architecture
//!
//! All git interactions flow through the [`GitClient`] trait: a stateless
//! capability that runs one discrete operation against a given working
//! directory. The registry and scheduler never spawn `git` themselves.
//!
//! Two implementations exist:
//!
//! - [`CommandGitClient`]: shells out to a configurable `git` binary
//! - [`MockGitClient`]: scripted in-memory fake for deterministic tests
//!
//! # Error Handling
//!
//! Process failures are categorized into typed variants:
//! - [`GitError::BinaryNotFound`]: the git executable is missing
//! - [`GitError::NothingToCommit`]: an empty commit was rejected
//! - [`GitError::CommandFailed`]: any other non-zero exit, stderr intact
//!
//! User-initiated operations propagate these untouched; advisory probes
//! (ignore checks, pre-registration remote detection) fail closed at the
//! call site, visibly in their signatures.

pub mod client;
pub mod mock;
pub mod process;
pub mod status;

pub use client::{GitClient, LogEntry, Remote};
pub use mock::{FailOn, MockGitClient, MockOperation};
pub use process::CommandGitClient;
pub use status::{translate, DisplayStatus, FileStatusEntry, RawStatus, RawStatusEntry, RepoStatus};

use thiserror::Error;

/// Errors from git process operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git executable was not found.
    #[error("git binary not found: {binary}")]
    BinaryNotFound {
        /// Binary name or path that was attempted
        binary: String,
    },

    /// Commit was rejected because nothing is staged.
    #[error("nothing to commit")]
    NothingToCommit,

    /// The git process exited non-zero.
    #[error("git {args:?} failed: {stderr}")]
    CommandFailed {
        /// Arguments passed to git
        args: Vec<String>,
        /// Trimmed stderr from the process
        stderr: String,
    },

    /// Output from the git process could not be interpreted.
    #[error("unexpected git output: {0}")]
    UnexpectedOutput(String),

    /// Failed to spawn or talk to the process.
    #[error("io error running git: {0}")]
    Io(#[from] std::io::Error),
}
