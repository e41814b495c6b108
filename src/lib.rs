//! gitvault - a registry for many git repositories inside one vault
//!
//! gitvault coordinates an arbitrary number of independent git working
//! directories living as subtrees of one larger directory tree (the
//! vault), each with its own remote, credentials, and autonomous commit
//! schedule. All history operations are delegated to the external git
//! executable; this crate's job is orchestration.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`core`] - Persisted configuration schema and vault path routing
//! - [`git`] - Single interface to the external git process
//! - [`registry`] - Owns repository instances; all reading/mutating operations
//! - [`scheduler`] - Per-repository unattended commit/push cycles
//! - [`credentials`] - https credential provisioning for push/pull
//! - [`ignore`] - Literal-match ignore-file editing
//! - [`forge`] - Hosting-provider REST boundary (repo creation, token checks)
//!
//! # Correctness Invariants
//!
//! 1. Folder ids are unique across the registered instance set
//! 2. A scheduler handle exists iff a repository's interval is positive
//! 3. Mutating operations against one repository are serialized; different
//!    repositories proceed in parallel
//! 4. Secrets are never embedded in remote URLs, logged, or committed
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use gitvault::core::config::{ProviderCredentials, RepoConfig};
//! use gitvault::credentials::CredentialSetup;
//! use gitvault::git::CommandGitClient;
//! use gitvault::registry::RepoRegistry;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = CredentialSetup::new(ProviderCredentials::default())?;
//! let registry = RepoRegistry::new(
//!     PathBuf::from("/home/me/vault"),
//!     Arc::new(CommandGitClient::new()),
//!     credentials,
//! );
//!
//! let failures = registry.initialize(vec![RepoConfig::new("work/notes")]).await;
//! for (folder_id, error) in &failures {
//!     eprintln!("could not register {folder_id}: {error}");
//! }
//!
//! let status = registry.status("work/notes").await?;
//! println!("{} changed files", status.changed.len());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod credentials;
pub mod forge;
pub mod git;
pub mod ignore;
pub mod registry;
pub mod scheduler;
