//! registry
//!
//! The repository registry: owns every [`RepoInstance`] and exposes all
//! reading and mutating operations, keyed by folder id.
//!
//! # Architecture
//!
//! The registry is an explicitly owned object with an injected lifecycle
//! (`initialize` / `shutdown`) — never a module-level singleton. Tests
//! construct independent registries per case, wiring in a
//! [`MockGitClient`](crate::git::MockGitClient) instead of the real
//! process client.
//!
//! Control flow: external callers name a folder id; the registry resolves
//! the instance, delegates to the git process boundary, and returns a
//! normalized result. The auto-commit scheduler is an internal driver over
//! the same instances.
//!
//! # Lifecycle invariants
//!
//! - Folder ids are unique across the instance set.
//! - A scheduler handle exists iff the configured interval is positive.
//! - Removing a repository stops its scheduler before the instance is
//!   discarded; shutdown stops all schedulers unconditionally.
//! - `add_repo` never creates a repository on disk — a directory that is
//!   not already a valid work tree is rejected with
//!   [`RegistryError::NotARepository`]. Bootstrap goes through
//!   [`RepoRegistry::init_repo`] / [`RepoRegistry::clone_repo`] first.

pub mod instance;

pub use instance::RepoInstance;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::config::RepoConfig;
use crate::core::paths::VaultPaths;
use crate::credentials::{CredentialError, CredentialSetup};
use crate::git::{GitClient, GitError, LogEntry, Remote, RepoStatus};
use crate::ignore::{self, IgnoreError};
use crate::scheduler::SchedulerHandle;

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No instance is registered for the folder id.
    #[error("no repository registered for folder '{0}'")]
    RepoNotFound(String),

    /// The directory exists but is not a valid git repository.
    #[error("not a git repository: {0}")]
    NotARepository(PathBuf),

    /// The git process failed; the underlying message is intact.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Ignore-file editing failed.
    #[error(transparent)]
    Ignore(#[from] IgnoreError),

    /// Credential provisioning failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// Registry owning all repository instances of one vault.
pub struct RepoRegistry {
    paths: VaultPaths,
    client: Arc<dyn GitClient>,
    credentials: Arc<CredentialSetup>,
    instances: RwLock<HashMap<String, Arc<RepoInstance>>>,
}

impl RepoRegistry {
    /// Create an empty registry for the vault rooted at `base`.
    pub fn new(base: PathBuf, client: Arc<dyn GitClient>, credentials: CredentialSetup) -> Self {
        Self {
            paths: VaultPaths::new(base),
            client,
            credentials: Arc::new(credentials),
            instances: RwLock::new(HashMap::new()),
        }
    }

    /// Path routing for this vault.
    pub fn paths(&self) -> &VaultPaths {
        &self.paths
    }

    // Lifecycle ----------------------------------------------------------

    /// Register every configured repository.
    ///
    /// A single failure is isolated: it is logged, collected into the
    /// returned list, and the remaining repositories still initialize.
    pub async fn initialize(&self, configs: Vec<RepoConfig>) -> Vec<(String, RegistryError)> {
        let mut failures = Vec::new();
        for config in configs {
            let folder_id = config.folder_id.clone();
            if let Err(e) = self.add_repo(config).await {
                warn!(folder_id = %folder_id, error = %e, "failed to initialize repository");
                failures.push((folder_id, e));
            }
        }
        failures
    }

    /// Register one repository.
    ///
    /// Verifies the resolved directory is a valid work tree, starts the
    /// auto-commit scheduler when configured, and registers the instance.
    /// Re-adding an existing folder id replaces the prior instance,
    /// stopping its scheduler first.
    pub async fn add_repo(&self, config: RepoConfig) -> Result<Arc<RepoInstance>, RegistryError> {
        let abs_path = self.paths.resolve_absolute(&config.folder_id);
        if !self.client.is_repository(&abs_path).await {
            return Err(RegistryError::NotARepository(abs_path));
        }

        let folder_id = config.folder_id.clone();
        let auto_commit = config.auto_commit_enabled();
        let instance = Arc::new(RepoInstance::new(config, abs_path, Arc::clone(&self.client)));

        if auto_commit {
            let handle =
                SchedulerHandle::spawn(Arc::clone(&instance), Arc::clone(&self.credentials));
            instance.attach_scheduler(handle);
        }

        let displaced = self
            .instances
            .write()
            .await
            .insert(folder_id.clone(), Arc::clone(&instance));
        if let Some(old) = displaced {
            old.stop_scheduler();
        }

        debug!(folder_id = %folder_id, auto_commit, "registered repository");
        Ok(instance)
    }

    /// Deregister a repository, stopping its scheduler.
    ///
    /// On-disk repository data is untouched.
    pub async fn remove_repo(&self, folder_id: &str) -> Result<(), RegistryError> {
        let removed = self.instances.write().await.remove(folder_id);
        match removed {
            Some(instance) => {
                instance.stop_scheduler();
                debug!(folder_id = %folder_id, "removed repository");
                Ok(())
            }
            None => Err(RegistryError::RepoNotFound(folder_id.to_string())),
        }
    }

    /// Tear down the registry: stop every scheduler, discard all instances.
    pub async fn shutdown(&self) {
        let mut instances = self.instances.write().await;
        for (_, instance) in instances.drain() {
            instance.stop_scheduler();
        }
    }

    // Resolution ---------------------------------------------------------

    /// Resolve a folder id to its live instance.
    pub async fn resolve(&self, folder_id: &str) -> Result<Arc<RepoInstance>, RegistryError> {
        self.instances
            .read()
            .await
            .get(folder_id)
            .cloned()
            .ok_or_else(|| RegistryError::RepoNotFound(folder_id.to_string()))
    }

    /// All registered folder ids.
    pub async fn folder_ids(&self) -> Vec<String> {
        self.instances.read().await.keys().cloned().collect()
    }

    /// The instance owning a vault-relative file path, by longest-prefix
    /// match over registered folder ids.
    pub async fn owner_of(&self, file_path: &str) -> Option<Arc<RepoInstance>> {
        let instances = self.instances.read().await;
        let owner = VaultPaths::owner_of(instances.keys().map(String::as_str), file_path)?;
        instances.get(owner).cloned()
    }

    // Status and history -------------------------------------------------

    /// Normalized status snapshot for one repository.
    pub async fn status(&self, folder_id: &str) -> Result<RepoStatus, RegistryError> {
        Ok(self.resolve(folder_id).await?.status().await?)
    }

    /// Unified diff of one file, `--cached` scope when `staged`.
    pub async fn diff(
        &self,
        folder_id: &str,
        file: &str,
        staged: bool,
    ) -> Result<String, RegistryError> {
        Ok(self.resolve(folder_id).await?.diff(file, staged).await?)
    }

    /// Most-recent-first history, bounded by `limit`.
    pub async fn log(&self, folder_id: &str, limit: usize) -> Result<Vec<LogEntry>, RegistryError> {
        Ok(self.resolve(folder_id).await?.log(limit).await?)
    }

    /// Currently checked-out branch.
    pub async fn branch(&self, folder_id: &str) -> Result<String, RegistryError> {
        Ok(self.resolve(folder_id).await?.branch().await?)
    }

    /// All local branches.
    pub async fn branches(&self, folder_id: &str) -> Result<Vec<String>, RegistryError> {
        Ok(self.resolve(folder_id).await?.branches().await?)
    }

    // Work-tree mutations ------------------------------------------------

    /// Stage the given repository-relative paths.
    pub async fn stage(&self, folder_id: &str, files: &[String]) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.stage(files).await?)
    }

    /// Stage every change.
    pub async fn stage_all(&self, folder_id: &str) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.stage_all().await?)
    }

    /// Unstage the given paths.
    pub async fn unstage(&self, folder_id: &str, files: &[String]) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.unstage(files).await?)
    }

    /// Unstage everything.
    pub async fn unstage_all(&self, folder_id: &str) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.unstage_all().await?)
    }

    /// Hard checkout-from-HEAD of the given paths. Irreversible.
    pub async fn discard(&self, folder_id: &str, files: &[String]) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.discard(files).await?)
    }

    /// Commit currently staged content.
    ///
    /// An empty index surfaces as [`GitError::NothingToCommit`], never
    /// swallowed.
    pub async fn commit(&self, folder_id: &str, message: &str) -> Result<String, RegistryError> {
        Ok(self.resolve(folder_id).await?.commit(message).await?)
    }

    /// Check out a branch.
    pub async fn checkout(&self, folder_id: &str, branch: &str) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.checkout(branch).await?)
    }

    // Remotes and sync ---------------------------------------------------

    /// Add a remote to a registered repository.
    pub async fn add_remote(
        &self,
        folder_id: &str,
        name: &str,
        url: &str,
    ) -> Result<(), RegistryError> {
        Ok(self.resolve(folder_id).await?.add_remote(name, url).await?)
    }

    /// List the remotes of a registered repository.
    pub async fn detect_remotes(&self, folder_id: &str) -> Result<Vec<Remote>, RegistryError> {
        Ok(self.resolve(folder_id).await?.remotes().await?)
    }

    /// List the remotes of an unregistered path.
    ///
    /// Fails closed: any error, including "not a repository", yields an
    /// empty list. Used by the add-repository workflow where remote
    /// information is advisory.
    pub async fn detect_remotes_from_path(&self, abs_path: &Path) -> Vec<Remote> {
        self.client.remotes(abs_path).await.unwrap_or_default()
    }

    /// Configure credentials, then push (set-upstream on first push).
    pub async fn push(&self, folder_id: &str) -> Result<(), RegistryError> {
        self.resolve(folder_id)
            .await?
            .push(self.credentials.as_ref())
            .await
    }

    /// Configure credentials, then pull.
    pub async fn pull(&self, folder_id: &str) -> Result<(), RegistryError> {
        self.resolve(folder_id)
            .await?
            .pull(self.credentials.as_ref())
            .await
    }

    // Bootstrap (pre-registration) ---------------------------------------

    /// Initialize a new repository at an absolute path.
    ///
    /// Does not register an instance; callers `add_repo` afterwards.
    pub async fn init_repo(&self, abs_path: &Path) -> Result<(), RegistryError> {
        Ok(self.client.init(abs_path).await?)
    }

    /// Clone a repository into an absolute path.
    ///
    /// Does not register an instance; callers `add_repo` afterwards.
    pub async fn clone_repo(&self, url: &str, abs_path: &Path) -> Result<(), RegistryError> {
        Ok(self.client.clone_repo(url, abs_path).await?)
    }

    // Ignore list --------------------------------------------------------

    /// Whether the ignore file lists the path literally.
    pub async fn is_explicitly_ignored(
        &self,
        folder_id: &str,
        relative: &str,
    ) -> Result<bool, RegistryError> {
        let instance = self.resolve(folder_id).await?;
        Ok(ignore::is_explicitly_ignored(instance.abs_path(), relative)?)
    }

    /// Authoritative ignore check via the git process.
    ///
    /// Fails closed: any process failure reads as not ignored.
    pub async fn is_ignored(&self, folder_id: &str, relative: &str) -> Result<bool, RegistryError> {
        let instance = self.resolve(folder_id).await?;
        Ok(instance
            .client()
            .check_ignore(instance.abs_path(), relative)
            .await)
    }

    /// Append a path to the repository's ignore file.
    pub async fn add_to_ignore_list(
        &self,
        folder_id: &str,
        relative: &str,
    ) -> Result<(), RegistryError> {
        let instance = self.resolve(folder_id).await?;
        Ok(ignore::add_to_ignore_list(instance.abs_path(), relative)?)
    }

    /// Remove exact matches of a path from the repository's ignore file.
    pub async fn remove_from_ignore_list(
        &self,
        folder_id: &str,
        relative: &str,
    ) -> Result<(), RegistryError> {
        let instance = self.resolve(folder_id).await?;
        Ok(ignore::remove_from_ignore_list(instance.abs_path(), relative)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ProviderCredentials;
    use crate::git::mock::{FailOn, MockOperation};
    use crate::git::{MockGitClient, RawStatus, RawStatusEntry};
    use tempfile::TempDir;

    fn registry_with(mock: &MockGitClient, base: PathBuf) -> RepoRegistry {
        let credentials = CredentialSetup::with_store_path(
            ProviderCredentials::default(),
            base.join(".gitvault-credentials"),
        );
        RepoRegistry::new(base, Arc::new(mock.clone()), credentials)
    }

    fn raw(entries: Vec<RawStatusEntry>) -> RawStatus {
        RawStatus {
            entries,
            ..RawStatus::default()
        }
    }

    fn entry(index: char, worktree: char, path: &str) -> RawStatusEntry {
        RawStatusEntry {
            index,
            worktree,
            path: path.to_string(),
        }
    }

    #[tokio::test]
    async fn add_repo_rejects_non_repository() {
        let mock = MockGitClient::new();
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        let err = registry
            .add_repo(RepoConfig::new("notes"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotARepository(_)));
        assert!(registry.folder_ids().await.is_empty());
    }

    #[tokio::test]
    async fn add_repo_registers_and_resolves() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        registry.add_repo(RepoConfig::new("notes")).await.unwrap();
        let instance = registry.resolve("notes").await.unwrap();
        assert_eq!(instance.abs_path(), Path::new("/vault/notes"));
        assert!(!instance.has_scheduler());
    }

    #[tokio::test]
    async fn scheduler_handle_iff_interval_positive() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/timed");
        mock.register_repository("/vault/manual");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        registry
            .add_repo(RepoConfig {
                auto_commit_interval_minutes: 5,
                ..RepoConfig::new("timed")
            })
            .await
            .unwrap();
        registry.add_repo(RepoConfig::new("manual")).await.unwrap();

        assert!(registry.resolve("timed").await.unwrap().has_scheduler());
        assert!(!registry.resolve("manual").await.unwrap().has_scheduler());

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn re_add_stops_displaced_scheduler() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        let first = registry
            .add_repo(RepoConfig {
                auto_commit_interval_minutes: 5,
                ..RepoConfig::new("notes")
            })
            .await
            .unwrap();
        assert!(first.has_scheduler());

        registry.add_repo(RepoConfig::new("notes")).await.unwrap();
        assert!(!first.has_scheduler());
        assert_eq!(registry.folder_ids().await.len(), 1);

        registry.shutdown().await;
    }

    #[tokio::test]
    async fn remove_repo_unknown_id_fails() {
        let mock = MockGitClient::new();
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        let err = registry.remove_repo("ghost").await.unwrap_err();
        assert!(matches!(err, RegistryError::RepoNotFound(_)));
    }

    #[tokio::test]
    async fn remove_repo_stops_scheduler() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        let instance = registry
            .add_repo(RepoConfig {
                auto_commit_interval_minutes: 5,
                ..RepoConfig::new("notes")
            })
            .await
            .unwrap();
        registry.remove_repo("notes").await.unwrap();

        assert!(!instance.has_scheduler());
        assert!(matches!(
            registry.status("notes").await.unwrap_err(),
            RegistryError::RepoNotFound(_)
        ));
    }

    #[tokio::test]
    async fn initialize_isolates_failures() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/good");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        let failures = registry
            .initialize(vec![RepoConfig::new("missing"), RepoConfig::new("good")])
            .await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "missing");
        assert!(registry.resolve("good").await.is_ok());
    }

    #[tokio::test]
    async fn status_scenario_modified_plus_untracked() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        mock.push_status(
            "/vault/notes",
            raw(vec![
                entry(' ', 'M', "todo-old.md"),
                entry('?', '?', "todo.md"),
            ]),
        );
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        let status = registry.status("notes").await.unwrap();
        assert_eq!(status.staged.len(), 0);
        assert_eq!(status.changed.len(), 1);
        assert_eq!(status.changed[0].relative_path, "todo-old.md");
        assert_eq!(
            status.changed[0].display_status,
            crate::git::DisplayStatus::Modified
        );
        assert_eq!(status.untracked, vec!["notes/todo.md"]);
        assert!(status.conflicted.is_empty());
    }

    #[tokio::test]
    async fn owner_of_uses_longest_prefix() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault");
        mock.register_repository("/vault/a");
        mock.register_repository("/vault/a/b");
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        registry.add_repo(RepoConfig::new("")).await.unwrap();
        registry.add_repo(RepoConfig::new("a")).await.unwrap();
        registry.add_repo(RepoConfig::new("a/b")).await.unwrap();

        let owner = registry.owner_of("a/b/c.md").await.unwrap();
        assert_eq!(owner.folder_id(), "a/b");
        let owner = registry.owner_of("a/x.md").await.unwrap();
        assert_eq!(owner.folder_id(), "a");
        let owner = registry.owner_of("z.md").await.unwrap();
        assert_eq!(owner.folder_id(), "");
    }

    #[tokio::test]
    async fn push_without_upstream_sets_it() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        mock.set_branch("/vault/notes", "main");
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        registry.push("notes").await.unwrap();

        let ops = mock.operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            MockOperation::Push {
                set_upstream: true,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn push_with_upstream_is_plain() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        mock.set_upstream("/vault/notes", true);
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        registry.push("notes").await.unwrap();

        let ops = mock.operations();
        assert!(ops.iter().any(|op| matches!(
            op,
            MockOperation::Push {
                set_upstream: false,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn push_configures_credentials_before_pushing() {
        let dir = TempDir::new().unwrap();
        let mock = MockGitClient::new();
        let notes = dir.path().join("notes");
        mock.register_repository(&notes);
        mock.set_remotes(
            &notes,
            vec![Remote {
                name: "origin".into(),
                url: "https://github.com/me/notes.git".into(),
            }],
        );

        let credentials = CredentialSetup::with_store_path(
            ProviderCredentials {
                token: Some("tok".into()),
                username: Some("me".into()),
            },
            dir.path().join("git-credentials"),
        );
        let registry = RepoRegistry::new(
            dir.path().to_path_buf(),
            Arc::new(mock.clone()),
            credentials,
        );
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        registry.push("notes").await.unwrap();

        let ops = mock.operations();
        let config_idx = ops
            .iter()
            .position(|op| matches!(op, MockOperation::SetLocalConfig { .. }))
            .expect("credential config write");
        let push_idx = ops
            .iter()
            .position(|op| matches!(op, MockOperation::Push { .. }))
            .expect("push");
        assert!(config_idx < push_idx);
    }

    #[tokio::test]
    async fn detect_remotes_from_path_fails_closed() {
        let mock = MockGitClient::new();
        mock.set_fail_on(Some(FailOn::Remotes("boom".into())));
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        let remotes = registry
            .detect_remotes_from_path(Path::new("/somewhere/else"))
            .await;
        assert!(remotes.is_empty());
    }

    #[tokio::test]
    async fn commit_error_propagates_with_message() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        mock.set_fail_on(Some(FailOn::Commit("hook rejected".into())));
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        let err = registry.commit("notes", "msg").await.unwrap_err();
        assert!(err.to_string().contains("hook rejected"));
    }

    #[tokio::test]
    async fn ignore_operations_route_by_folder_id() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes");
        std::fs::create_dir_all(&notes).unwrap();

        let mock = MockGitClient::new();
        mock.register_repository(&notes);
        let registry = registry_with(&mock, dir.path().to_path_buf());
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        assert!(!registry
            .is_explicitly_ignored("notes", "cache")
            .await
            .unwrap());
        registry.add_to_ignore_list("notes", "cache").await.unwrap();
        assert!(registry
            .is_explicitly_ignored("notes", "cache")
            .await
            .unwrap());
        registry
            .remove_from_ignore_list("notes", "cache")
            .await
            .unwrap();
        assert!(!registry
            .is_explicitly_ignored("notes", "cache")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn is_ignored_delegates_to_process_check() {
        let mock = MockGitClient::new();
        mock.register_repository("/vault/notes");
        mock.set_ignored("/vault/notes", "build");
        let registry = registry_with(&mock, PathBuf::from("/vault"));
        registry.add_repo(RepoConfig::new("notes")).await.unwrap();

        assert!(registry.is_ignored("notes", "build").await.unwrap());
        assert!(!registry.is_ignored("notes", "src").await.unwrap());
    }

    #[tokio::test]
    async fn bootstrap_does_not_register() {
        let mock = MockGitClient::new();
        let registry = registry_with(&mock, PathBuf::from("/vault"));

        registry
            .init_repo(Path::new("/vault/fresh"))
            .await
            .unwrap();
        registry
            .clone_repo("https://example.com/r.git", Path::new("/vault/cloned"))
            .await
            .unwrap();

        assert!(registry.folder_ids().await.is_empty());
        // The paths are now valid repositories for a later add_repo.
        registry.add_repo(RepoConfig::new("fresh")).await.unwrap();
        registry.add_repo(RepoConfig::new("cloned")).await.unwrap();
    }
}
