//! core
//!
//! Domain foundation: persisted configuration schema and vault path routing.

pub mod config;
pub mod paths;

pub use config::{ConfigError, ProviderCredentials, RepoConfig, VaultSettings};
pub use paths::VaultPaths;
