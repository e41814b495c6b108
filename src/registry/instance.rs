//! registry::instance
//!
//! The unit of registry state: one configured folder bound to the git
//! process boundary.
//!
//! # Concurrency
//!
//! Every instance carries its own async operation lock. All mutating
//! operations — stage, unstage, discard, checkout, commit, push, pull and
//! the whole auto-commit cycle — hold it for their full duration, because
//! the external git process mutates a shared on-disk index. Two mutations
//! racing on the same repository would corrupt it; mutations on different
//! repositories proceed fully in parallel.
//!
//! Reads (status, diff, log, branch listing) run unserialized — git
//! tolerates concurrent readers.
//!
//! The `_unlocked` variants exist for the scheduler, which takes the lock
//! once around an entire stage → commit → push cycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use super::RegistryError;
use crate::core::config::RepoConfig;
use crate::credentials::CredentialSetup;
use crate::git::{translate, GitClient, GitError, LogEntry, Remote, RepoStatus};
use crate::scheduler::SchedulerHandle;

/// Runtime binding of a configured folder to the git process boundary.
///
/// Exactly one instance exists per folder id; the registry exclusively
/// owns the instance set.
pub struct RepoInstance {
    config: RepoConfig,
    abs_path: PathBuf,
    client: Arc<dyn GitClient>,
    /// Serializes mutating operations against this repository.
    op_lock: Mutex<()>,
    /// Auto-commit scheduler handle; `Some` iff the configured interval
    /// is positive and the instance is live.
    scheduler: std::sync::Mutex<Option<SchedulerHandle>>,
}

impl std::fmt::Debug for RepoInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoInstance")
            .field("folder_id", &self.config.folder_id)
            .field("abs_path", &self.abs_path)
            .field("scheduler", &self.has_scheduler())
            .finish()
    }
}

impl RepoInstance {
    pub(crate) fn new(config: RepoConfig, abs_path: PathBuf, client: Arc<dyn GitClient>) -> Self {
        Self {
            config,
            abs_path,
            client,
            op_lock: Mutex::new(()),
            scheduler: std::sync::Mutex::new(None),
        }
    }

    /// Configuration this instance was registered with.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Folder id key of this instance.
    pub fn folder_id(&self) -> &str {
        &self.config.folder_id
    }

    /// Absolute path of the working directory.
    pub fn abs_path(&self) -> &Path {
        &self.abs_path
    }

    pub(crate) fn client(&self) -> &Arc<dyn GitClient> {
        &self.client
    }

    /// Acquire the per-repository operation lock.
    pub(crate) async fn lock_ops(&self) -> MutexGuard<'_, ()> {
        self.op_lock.lock().await
    }

    // Scheduler slot -----------------------------------------------------

    pub(crate) fn attach_scheduler(&self, handle: SchedulerHandle) {
        let mut slot = self.scheduler.lock().expect("scheduler slot poisoned");
        if let Some(old) = slot.replace(handle) {
            old.stop();
        }
    }

    /// Stop and release the scheduler, if one is attached.
    pub(crate) fn stop_scheduler(&self) {
        let mut slot = self.scheduler.lock().expect("scheduler slot poisoned");
        if let Some(handle) = slot.take() {
            handle.stop();
            debug!(folder_id = %self.config.folder_id, "stopped auto-commit scheduler");
        }
    }

    /// Whether an auto-commit scheduler is currently attached.
    pub fn has_scheduler(&self) -> bool {
        self.scheduler
            .lock()
            .expect("scheduler slot poisoned")
            .is_some()
    }

    // Reads (unserialized) -----------------------------------------------

    /// Normalized status snapshot, recomputed on every call.
    pub async fn status(&self) -> Result<RepoStatus, GitError> {
        self.status_unlocked().await
    }

    /// Unified diff of one file; `--cached` scope when `staged`.
    pub async fn diff(&self, file: &str, staged: bool) -> Result<String, GitError> {
        self.client.diff_file(&self.abs_path, file, staged).await
    }

    /// Most-recent-first history, bounded by `limit`.
    pub async fn log(&self, limit: usize) -> Result<Vec<LogEntry>, GitError> {
        self.client.log(&self.abs_path, limit).await
    }

    /// Currently checked-out branch.
    pub async fn branch(&self) -> Result<String, GitError> {
        self.client.current_branch(&self.abs_path).await
    }

    /// All local branches.
    pub async fn branches(&self) -> Result<Vec<String>, GitError> {
        self.client.branches(&self.abs_path).await
    }

    /// Configured remotes.
    pub async fn remotes(&self) -> Result<Vec<Remote>, GitError> {
        self.client.remotes(&self.abs_path).await
    }

    // Mutations (serialized) ---------------------------------------------

    /// Stage the given repository-relative paths.
    pub async fn stage(&self, files: &[String]) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.stage(&self.abs_path, files).await
    }

    /// Stage every change, including untracked files.
    pub async fn stage_all(&self) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.stage_all_unlocked().await
    }

    /// Unstage the given paths, keeping working-tree content.
    pub async fn unstage(&self, files: &[String]) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.unstage(&self.abs_path, files).await
    }

    /// Unstage everything.
    pub async fn unstage_all(&self) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.unstage_all(&self.abs_path).await
    }

    /// Hard checkout-from-HEAD of the given paths.
    ///
    /// Irreversible: uncommitted edits to those paths are destroyed.
    pub async fn discard(&self, files: &[String]) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.discard(&self.abs_path, files).await
    }

    /// Commit currently staged content.
    pub async fn commit(&self, message: &str) -> Result<String, GitError> {
        let _guard = self.lock_ops().await;
        self.commit_unlocked(message).await
    }

    /// Check out a branch.
    pub async fn checkout(&self, branch: &str) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.checkout(&self.abs_path, branch).await
    }

    /// Add a remote.
    pub async fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        let _guard = self.lock_ops().await;
        self.client.add_remote(&self.abs_path, name, url).await
    }

    /// Configure credentials, then push; sets upstream on first push.
    pub async fn push(&self, credentials: &CredentialSetup) -> Result<(), RegistryError> {
        let _guard = self.lock_ops().await;
        self.push_unlocked(credentials).await
    }

    /// Configure credentials, then pull.
    pub async fn pull(&self, credentials: &CredentialSetup) -> Result<(), RegistryError> {
        let _guard = self.lock_ops().await;
        credentials
            .configure(self.client.as_ref(), &self.abs_path, &self.config.remote_name)
            .await?;
        self.client.pull(&self.abs_path).await?;
        Ok(())
    }

    // Lock-free internals for the scheduler cycle ------------------------

    pub(crate) async fn status_unlocked(&self) -> Result<RepoStatus, GitError> {
        let raw = self.client.status(&self.abs_path).await?;
        Ok(translate(&self.config.folder_id, &raw))
    }

    pub(crate) async fn stage_all_unlocked(&self) -> Result<(), GitError> {
        self.client.stage_all(&self.abs_path).await
    }

    pub(crate) async fn commit_unlocked(&self, message: &str) -> Result<String, GitError> {
        self.client.commit(&self.abs_path, message).await
    }

    pub(crate) async fn push_unlocked(
        &self,
        credentials: &CredentialSetup,
    ) -> Result<(), RegistryError> {
        credentials
            .configure(self.client.as_ref(), &self.abs_path, &self.config.remote_name)
            .await?;

        let branch = self.client.current_branch(&self.abs_path).await?;
        let set_upstream = !self.client.has_upstream(&self.abs_path).await;
        self.client
            .push(&self.abs_path, &self.config.remote_name, &branch, set_upstream)
            .await?;
        Ok(())
    }
}
