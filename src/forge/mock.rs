//! forge::mock
//!
//! Mock hosting provider for deterministic testing.
//!
//! # Example
//!
//! ```
//! use gitvault::forge::{CreateRepoRequest, HostingProvider, MockProvider};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new("octocat");
//!
//! let account = provider.validate_token().await.unwrap();
//! assert_eq!(account.login, "octocat");
//!
//! let repo = provider.create_repository(CreateRepoRequest {
//!     name: "notes".into(),
//!     private: true,
//!     description: None,
//! }).await.unwrap();
//! assert_eq!(repo.full_name, "octocat/notes");
//! # });
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{
    AccountInfo, CreateRepoRequest, CreatedRepo, ForgeError, HostingProvider,
};

/// In-memory hosting provider for tests.
#[derive(Debug, Clone)]
pub struct MockProvider {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug)]
struct Inner {
    login: String,
    created: Vec<CreatedRepo>,
    fail_with: Option<ForgeError>,
}

impl MockProvider {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                login: login.into(),
                created: Vec::new(),
                fail_with: None,
            })),
        }
    }

    /// Make every operation fail with the given error.
    pub fn set_fail_with(&self, error: Option<ForgeError>) {
        self.lock().fail_with = error;
    }

    /// Repositories created so far.
    pub fn created(&self) -> Vec<CreatedRepo> {
        self.lock().created.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock poisoned")
    }
}

#[async_trait]
impl HostingProvider for MockProvider {
    async fn validate_token(&self) -> Result<AccountInfo, ForgeError> {
        let inner = self.lock();
        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }
        Ok(AccountInfo {
            login: inner.login.clone(),
            display_name: None,
            avatar_url: None,
        })
    }

    async fn create_repository(
        &self,
        request: CreateRepoRequest,
    ) -> Result<CreatedRepo, ForgeError> {
        let mut inner = self.lock();
        if let Some(err) = &inner.fail_with {
            return Err(err.clone());
        }
        let full_name = format!("{}/{}", inner.login, request.name);
        let repo = CreatedRepo {
            web_url: format!("https://github.com/{full_name}"),
            https_clone_url: format!("https://github.com/{full_name}.git"),
            ssh_url: format!("git@github.com:{full_name}.git"),
            private: request.private,
            full_name,
        };
        inner.created.push(repo.clone());
        Ok(repo)
    }
}
