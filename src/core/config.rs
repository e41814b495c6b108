//! core::config
//!
//! Persisted configuration schema: per-repository settings and vault-level
//! settings.
//!
//! # Overview
//!
//! The vault carries one settings file with two scopes:
//! - **Per repository**: an ordered list of [`RepoConfig`] entries, one per
//!   tracked folder, keyed by `folder_id`.
//! - **Vault-wide**: [`VaultSettings`] holding the git binary location, the
//!   untracked-file visibility toggle, the status poll interval consumed by
//!   the (external) presentation layer, and hosting-provider credentials.
//!
//! # Storage
//!
//! Settings are stored as TOML. Writes are atomic (temp file + rename) so a
//! crash mid-save never leaves a truncated settings file.
//!
//! # Validation
//!
//! [`VaultSettings::validate`] rejects duplicate folder ids — the registry
//! relies on folder ids being unique keys.
//!
//! # Example
//!
//! ```
//! use gitvault::core::config::RepoConfig;
//!
//! let config = RepoConfig::new("work/notes");
//! assert_eq!(config.remote_name, "origin");
//! assert_eq!(config.auto_commit_interval_minutes, 0);
//! ```

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the settings file.
    #[error("cannot read settings file {path}: {source}")]
    ReadError {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Settings file is not valid TOML.
    #[error("cannot parse settings file {path}: {message}")]
    ParseError {
        /// Path that failed to parse
        path: PathBuf,
        /// Parser message
        message: String,
    },

    /// Failed to write the settings file.
    #[error("cannot write settings file {path}: {source}")]
    WriteError {
        /// Path that failed to write
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// A settings value is invalid.
    #[error("invalid settings value: {0}")]
    InvalidValue(String),
}

/// Default remote name for newly tracked repositories.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Default commit message template for auto-commits.
pub const DEFAULT_COMMIT_TEMPLATE: &str = "vault backup: {{date}}";

fn default_remote_name() -> String {
    DEFAULT_REMOTE_NAME.to_string()
}

fn default_commit_template() -> String {
    DEFAULT_COMMIT_TEMPLATE.to_string()
}

fn default_show_untracked() -> bool {
    true
}

/// Identity and behavior for one tracked folder.
///
/// `folder_id` is the vault-relative path of the repository root and the
/// unique key for every registry operation. The empty string denotes the
/// vault root.
///
/// # Example
///
/// ```toml
/// [[repos]]
/// folder_id = "work/notes"
/// remote_name = "origin"
/// remote_url = "https://github.com/me/notes.git"
/// auto_push = true
/// auto_commit_interval_minutes = 15
/// commit_message_template = "vault backup: {{date}}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepoConfig {
    /// Vault-relative path of the repository root ("" = vault root).
    pub folder_id: String,

    /// Remote used for push/pull (default "origin").
    pub remote_name: String,

    /// URL of the configured remote, if known.
    pub remote_url: Option<String>,

    /// Push automatically after each auto-commit.
    pub auto_push: bool,

    /// Minutes between auto-commit firings; 0 disables the scheduler.
    pub auto_commit_interval_minutes: u32,

    /// Commit message template; `{{date}}` expands to the current time
    /// in ISO-8601 with milliseconds.
    pub commit_message_template: String,

    /// Name of the repository on the hosting provider, if created there.
    pub hosted_repo_name: Option<String>,

    /// Visibility of the hosted repository, if created there.
    pub hosted_private: Option<bool>,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            folder_id: String::new(),
            remote_name: default_remote_name(),
            remote_url: None,
            auto_push: false,
            auto_commit_interval_minutes: 0,
            commit_message_template: default_commit_template(),
            hosted_repo_name: None,
            hosted_private: None,
        }
    }
}

impl RepoConfig {
    /// Create a config for the given folder id with all defaults.
    pub fn new(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: folder_id.into(),
            ..Self::default()
        }
    }

    /// Whether the auto-commit scheduler should run for this repository.
    pub fn auto_commit_enabled(&self) -> bool {
        self.auto_commit_interval_minutes > 0
    }
}

/// Hosting-provider credentials (token plus the login derived from it).
///
/// The token is never serialized into error messages or logs; it lives in
/// the settings file the host application already protects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProviderCredentials {
    /// Personal access token for the hosting provider.
    pub token: Option<String>,

    /// Login name derived from validating the token.
    pub username: Option<String>,
}

impl ProviderCredentials {
    /// Both halves present, ready for credential provisioning.
    pub fn is_complete(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Vault-wide persisted settings.
///
/// # Example
///
/// ```toml
/// git_binary = "/usr/bin/git"
/// show_untracked = true
/// status_poll_interval_secs = 30
///
/// [provider]
/// username = "octocat"
///
/// [[repos]]
/// folder_id = "work/notes"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VaultSettings {
    /// Ordered list of tracked repositories.
    pub repos: Vec<RepoConfig>,

    /// Explicit git binary location; `None` resolves from `PATH`.
    pub git_binary: Option<PathBuf>,

    /// Whether the presentation layer shows untracked files.
    pub show_untracked: bool,

    /// Seconds between status polls in the presentation layer; 0 disables
    /// polling. The registry itself never polls.
    pub status_poll_interval_secs: u32,

    /// Hosting-provider credentials.
    pub provider: ProviderCredentials,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            repos: Vec::new(),
            git_binary: None,
            show_untracked: default_show_untracked(),
            status_poll_interval_secs: 0,
            provider: ProviderCredentials::default(),
        }
    }
}

impl VaultSettings {
    /// Load settings from a TOML file.
    ///
    /// A missing file yields the defaults, matching first-run behavior.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings to a TOML file atomically (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;
        drop(file);

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when two repo entries share a
    /// folder id or a remote name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for repo in &self.repos {
            if !seen.insert(repo.folder_id.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate folder id '{}'",
                    repo.folder_id
                )));
            }
            if repo.remote_name.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "empty remote name for folder '{}'",
                    repo.folder_id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn repo_config_defaults() {
        let config = RepoConfig::new("notes");
        assert_eq!(config.folder_id, "notes");
        assert_eq!(config.remote_name, "origin");
        assert!(!config.auto_push);
        assert!(!config.auto_commit_enabled());
        assert!(config.commit_message_template.contains("{{date}}"));
    }

    #[test]
    fn auto_commit_enabled_iff_positive_interval() {
        let mut config = RepoConfig::new("notes");
        assert!(!config.auto_commit_enabled());
        config.auto_commit_interval_minutes = 5;
        assert!(config.auto_commit_enabled());
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = VaultSettings::load(&dir.path().join("settings.toml")).unwrap();
        assert!(settings.repos.is_empty());
        assert!(settings.show_untracked);
        assert_eq!(settings.status_poll_interval_secs, 0);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");

        let mut settings = VaultSettings::default();
        settings.repos.push(RepoConfig {
            folder_id: "work/notes".into(),
            remote_url: Some("https://example.com/notes.git".into()),
            auto_push: true,
            auto_commit_interval_minutes: 15,
            ..RepoConfig::default()
        });
        settings.provider.username = Some("octocat".into());
        settings.save(&path).unwrap();

        let loaded = VaultSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn duplicate_folder_ids_rejected() {
        let mut settings = VaultSettings::default();
        settings.repos.push(RepoConfig::new("a"));
        settings.repos.push(RepoConfig::new("a"));
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate folder id"));
    }

    #[test]
    fn missing_fields_fill_defaults() {
        // Older settings files may miss newer fields entirely.
        let settings: VaultSettings =
            toml::from_str("[[repos]]\nfolder_id = \"x\"\n").expect("parse");
        assert_eq!(settings.repos.len(), 1);
        assert_eq!(settings.repos[0].remote_name, "origin");
    }

    #[test]
    fn provider_credentials_completeness() {
        let mut creds = ProviderCredentials::default();
        assert!(!creds.is_complete());
        creds.token = Some("tok".into());
        assert!(!creds.is_complete());
        creds.username = Some("me".into());
        assert!(creds.is_complete());
        creds.token = Some(String::new());
        assert!(!creds.is_complete());
    }
}
