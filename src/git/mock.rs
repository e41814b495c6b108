//! git::mock
//!
//! Mock git client for deterministic testing.
//!
//! # Design
//!
//! The mock keeps all repository state in memory and never touches a real
//! git process. Tests script it by registering repository paths, queueing
//! raw statuses, and configuring failure injection; afterwards they assert
//! on the recorded operation list.
//!
//! # Example
//!
//! ```
//! use gitvault::git::{GitClient, MockGitClient, RawStatus};
//! use std::path::Path;
//!
//! # tokio_test::block_on(async {
//! let mock = MockGitClient::new();
//! mock.register_repository("/vault/notes");
//!
//! assert!(mock.is_repository(Path::new("/vault/notes")).await);
//! assert!(!mock.is_repository(Path::new("/vault/other")).await);
//!
//! let status = mock.status(Path::new("/vault/notes")).await.unwrap();
//! assert_eq!(status.branch.as_deref(), Some("main"));
//! # });
//! ```

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::client::{GitClient, LogEntry, Remote};
use super::status::RawStatus;
use super::GitError;

/// Which operation should fail, and with what stderr text.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `status` calls.
    Status(String),
    /// Fail `stage_all` calls.
    StageAll(String),
    /// Fail `commit` calls.
    Commit(String),
    /// Fail `push` calls.
    Push(String),
    /// Fail `pull` calls.
    Pull(String),
    /// Fail `remotes` calls.
    Remotes(String),
}

/// Recorded operation for post-hoc verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Init(PathBuf),
    Clone { url: String, path: PathBuf },
    Stage { path: PathBuf, files: Vec<String> },
    StageAll(PathBuf),
    Unstage { path: PathBuf, files: Vec<String> },
    UnstageAll(PathBuf),
    Discard { path: PathBuf, files: Vec<String> },
    Commit { path: PathBuf, message: String },
    Checkout { path: PathBuf, branch: String },
    AddRemote { path: PathBuf, name: String, url: String },
    Push {
        path: PathBuf,
        remote: String,
        branch: String,
        set_upstream: bool,
    },
    Pull(PathBuf),
    SetLocalConfig {
        path: PathBuf,
        key: String,
        value: String,
    },
}

/// In-memory git client for tests.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockGitClient {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Paths that count as valid repositories.
    repositories: HashSet<PathBuf>,
    /// Queued statuses per path; the last one repeats once drained.
    statuses: HashMap<PathBuf, VecDeque<RawStatus>>,
    /// Current branch per path (default "main").
    branches: HashMap<PathBuf, String>,
    /// Local branch listings per path.
    branch_lists: HashMap<PathBuf, Vec<String>>,
    /// Remotes per path.
    remotes: HashMap<PathBuf, Vec<Remote>>,
    /// Paths whose current branch has an upstream.
    upstreams: HashSet<PathBuf>,
    /// Scripted log output per path.
    logs: HashMap<PathBuf, Vec<LogEntry>>,
    /// Ignored (path, file) pairs for `check_ignore`.
    ignored: HashSet<(PathBuf, String)>,
    /// Repository-local config writes, in order.
    local_config: Vec<(PathBuf, String, String)>,
    /// Failure injection.
    fail_on: Option<FailOn>,
    /// Every mutating call, in order.
    operations: Vec<MockOperation>,
    /// Commit counter used to mint hashes.
    commit_count: u64,
}

impl MockGitClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a path as a valid repository.
    pub fn register_repository(&self, path: impl Into<PathBuf>) {
        self.lock().repositories.insert(path.into());
    }

    /// Queue a raw status for a path. Queued statuses are consumed in
    /// order; the final one repeats for subsequent calls.
    pub fn push_status(&self, path: impl Into<PathBuf>, status: RawStatus) {
        self.lock()
            .statuses
            .entry(path.into())
            .or_default()
            .push_back(status);
    }

    /// Set the current branch reported for a path.
    pub fn set_branch(&self, path: impl Into<PathBuf>, branch: impl Into<String>) {
        self.lock().branches.insert(path.into(), branch.into());
    }

    /// Set the local branch listing for a path.
    pub fn set_branch_list(&self, path: impl Into<PathBuf>, branches: Vec<String>) {
        self.lock().branch_lists.insert(path.into(), branches);
    }

    /// Set the configured remotes for a path.
    pub fn set_remotes(&self, path: impl Into<PathBuf>, remotes: Vec<Remote>) {
        self.lock().remotes.insert(path.into(), remotes);
    }

    /// Mark the current branch of a path as having an upstream.
    pub fn set_upstream(&self, path: impl Into<PathBuf>, has_upstream: bool) {
        let path = path.into();
        let mut inner = self.lock();
        if has_upstream {
            inner.upstreams.insert(path);
        } else {
            inner.upstreams.remove(&path);
        }
    }

    /// Script the history returned by `log`.
    pub fn set_log(&self, path: impl Into<PathBuf>, entries: Vec<LogEntry>) {
        self.lock().logs.insert(path.into(), entries);
    }

    /// Mark a file as ignored for `check_ignore`.
    pub fn set_ignored(&self, path: impl Into<PathBuf>, file: impl Into<String>) {
        self.lock().ignored.insert((path.into(), file.into()));
    }

    /// Install or clear failure injection.
    pub fn set_fail_on(&self, fail: Option<FailOn>) {
        self.lock().fail_on = fail;
    }

    /// Every mutating operation recorded so far, in call order.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.lock().operations.clone()
    }

    /// Repository-local config writes, in call order.
    pub fn local_config_writes(&self) -> Vec<(PathBuf, String, String)> {
        self.lock().local_config.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock poisoned")
    }

    fn fail(inner: &Inner, check: impl Fn(&FailOn) -> Option<&String>) -> Result<(), GitError> {
        if let Some(fail) = &inner.fail_on {
            if let Some(stderr) = check(fail) {
                return Err(GitError::CommandFailed {
                    args: vec!["<mock>".to_string()],
                    stderr: stderr.clone(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GitClient for MockGitClient {
    async fn is_repository(&self, path: &Path) -> bool {
        self.lock().repositories.contains(path)
    }

    async fn init(&self, path: &Path) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.repositories.insert(path.to_path_buf());
        inner.operations.push(MockOperation::Init(path.to_path_buf()));
        Ok(())
    }

    async fn clone_repo(&self, url: &str, path: &Path) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner.repositories.insert(path.to_path_buf());
        inner.operations.push(MockOperation::Clone {
            url: url.to_string(),
            path: path.to_path_buf(),
        });
        Ok(())
    }

    async fn status(&self, path: &Path) -> Result<RawStatus, GitError> {
        let mut inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::Status(msg) => Some(msg),
            _ => None,
        })?;
        let branch = inner
            .branches
            .get(path)
            .cloned()
            .unwrap_or_else(|| "main".to_string());
        let queue = inner.statuses.entry(path.to_path_buf()).or_default();
        let mut status = match queue.len() {
            0 => RawStatus::default(),
            1 => queue.front().cloned().unwrap_or_default(),
            _ => queue.pop_front().unwrap_or_default(),
        };
        if status.branch.is_none() {
            status.branch = Some(branch);
        }
        Ok(status)
    }

    async fn stage(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        self.lock().operations.push(MockOperation::Stage {
            path: path.to_path_buf(),
            files: files.to_vec(),
        });
        Ok(())
    }

    async fn stage_all(&self, path: &Path) -> Result<(), GitError> {
        let mut inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::StageAll(msg) => Some(msg),
            _ => None,
        })?;
        inner
            .operations
            .push(MockOperation::StageAll(path.to_path_buf()));
        Ok(())
    }

    async fn unstage(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        self.lock().operations.push(MockOperation::Unstage {
            path: path.to_path_buf(),
            files: files.to_vec(),
        });
        Ok(())
    }

    async fn unstage_all(&self, path: &Path) -> Result<(), GitError> {
        self.lock()
            .operations
            .push(MockOperation::UnstageAll(path.to_path_buf()));
        Ok(())
    }

    async fn discard(&self, path: &Path, files: &[String]) -> Result<(), GitError> {
        self.lock().operations.push(MockOperation::Discard {
            path: path.to_path_buf(),
            files: files.to_vec(),
        });
        Ok(())
    }

    async fn commit(&self, path: &Path, message: &str) -> Result<String, GitError> {
        let mut inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::Commit(msg) => Some(msg),
            _ => None,
        })?;
        inner.commit_count += 1;
        let hash = format!("{:040x}", inner.commit_count);
        inner.operations.push(MockOperation::Commit {
            path: path.to_path_buf(),
            message: message.to_string(),
        });
        Ok(hash)
    }

    async fn diff_file(&self, _path: &Path, file: &str, staged: bool) -> Result<String, GitError> {
        let scope = if staged { "staged" } else { "unstaged" };
        Ok(format!("mock diff ({scope}) for {file}"))
    }

    async fn log(&self, path: &Path, limit: usize) -> Result<Vec<LogEntry>, GitError> {
        let inner = self.lock();
        let entries = inner.logs.get(path).cloned().unwrap_or_default();
        Ok(entries.into_iter().take(limit).collect())
    }

    async fn current_branch(&self, path: &Path) -> Result<String, GitError> {
        Ok(self
            .lock()
            .branches
            .get(path)
            .cloned()
            .unwrap_or_else(|| "main".to_string()))
    }

    async fn branches(&self, path: &Path) -> Result<Vec<String>, GitError> {
        let inner = self.lock();
        Ok(inner
            .branch_lists
            .get(path)
            .cloned()
            .unwrap_or_else(|| vec!["main".to_string()]))
    }

    async fn checkout(&self, path: &Path, branch: &str) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner
            .branches
            .insert(path.to_path_buf(), branch.to_string());
        inner.operations.push(MockOperation::Checkout {
            path: path.to_path_buf(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    async fn remotes(&self, path: &Path) -> Result<Vec<Remote>, GitError> {
        let inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::Remotes(msg) => Some(msg),
            _ => None,
        })?;
        Ok(inner.remotes.get(path).cloned().unwrap_or_default())
    }

    async fn add_remote(&self, path: &Path, name: &str, url: &str) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner
            .remotes
            .entry(path.to_path_buf())
            .or_default()
            .push(Remote {
                name: name.to_string(),
                url: url.to_string(),
            });
        inner.operations.push(MockOperation::AddRemote {
            path: path.to_path_buf(),
            name: name.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }

    async fn has_upstream(&self, path: &Path) -> bool {
        self.lock().upstreams.contains(path)
    }

    async fn push(
        &self,
        path: &Path,
        remote: &str,
        branch: &str,
        set_upstream: bool,
    ) -> Result<(), GitError> {
        let mut inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::Push(msg) => Some(msg),
            _ => None,
        })?;
        inner.operations.push(MockOperation::Push {
            path: path.to_path_buf(),
            remote: remote.to_string(),
            branch: branch.to_string(),
            set_upstream,
        });
        Ok(())
    }

    async fn pull(&self, path: &Path) -> Result<(), GitError> {
        let mut inner = self.lock();
        Self::fail(&inner, |f| match f {
            FailOn::Pull(msg) => Some(msg),
            _ => None,
        })?;
        inner.operations.push(MockOperation::Pull(path.to_path_buf()));
        Ok(())
    }

    async fn check_ignore(&self, path: &Path, file: &str) -> bool {
        self.lock()
            .ignored
            .contains(&(path.to_path_buf(), file.to_string()))
    }

    async fn set_local_config(
        &self,
        path: &Path,
        key: &str,
        value: &str,
    ) -> Result<(), GitError> {
        let mut inner = self.lock();
        inner
            .local_config
            .push((path.to_path_buf(), key.to_string(), value.to_string()));
        inner.operations.push(MockOperation::SetLocalConfig {
            path: path.to_path_buf(),
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }
}
