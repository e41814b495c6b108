//! forge
//!
//! Hosting-provider boundary used by the add-repository workflow.
//!
//! # Architecture
//!
//! The registry never talks to a hosting service directly; the workflow
//! that creates a remote repository and derives the credential username
//! goes through the [`HostingProvider`] trait:
//!
//! - [`GitHubProvider`]: GitHub REST implementation
//! - [`MockProvider`]: deterministic in-memory implementation for tests

pub mod github;
pub mod mock;
pub mod traits;

pub use github::GitHubProvider;
pub use mock::MockProvider;
pub use traits::{AccountInfo, CreateRepoRequest, CreatedRepo, ForgeError, HostingProvider};
