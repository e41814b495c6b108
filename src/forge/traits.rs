//! forge::traits
//!
//! Hosting-provider trait for the add-repository workflow.
//!
//! # Design
//!
//! The provider boundary is deliberately narrow: validate a token and
//! create a remote repository. Everything else the registry needs happens
//! through the git process. The trait is async because both operations are
//! network calls.
//!
//! Tokens travel only in the authorization header — never in URLs and
//! never into error messages.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Errors from hosting-provider operations.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication failed (invalid or expired token).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The provider returned a non-2xx status.
    #[error("provider error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the provider, when available
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),
}

/// Account information derived from a valid token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountInfo {
    /// Login name (used as the credential username).
    pub login: String,
    /// Human-readable display name, when set.
    pub display_name: Option<String>,
    /// Avatar image URL, when available.
    pub avatar_url: Option<String>,
}

/// Request to create a hosted repository.
#[derive(Debug, Clone)]
pub struct CreateRepoRequest {
    /// Repository name.
    pub name: String,
    /// Create as private.
    pub private: bool,
    /// Optional description.
    pub description: Option<String>,
}

/// A repository created on the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedRepo {
    /// Owner-qualified name (e.g. "me/notes").
    pub full_name: String,
    /// Web URL for viewing.
    pub web_url: String,
    /// https clone URL (what the registry configures as the remote).
    pub https_clone_url: String,
    /// ssh clone URL.
    pub ssh_url: String,
    /// Whether the repository is private.
    pub private: bool,
}

/// Remote hosting service operations.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Validate the configured token, returning the account it belongs to.
    async fn validate_token(&self) -> Result<AccountInfo, ForgeError>;

    /// Create a repository under the token's account.
    async fn create_repository(&self, request: CreateRepoRequest)
        -> Result<CreatedRepo, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_keeps_provider_message() {
        let err = ForgeError::ApiError {
            status: 422,
            message: "name already exists".into(),
        };
        assert!(err.to_string().contains("422"));
        assert!(err.to_string().contains("name already exists"));
    }
}
