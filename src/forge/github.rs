//! forge::github
//!
//! GitHub implementation of the hosting-provider boundary.
//!
//! # Design
//!
//! Two REST calls: `GET /user` for token validation and `POST /user/repos`
//! for repository creation. The base URL is configurable for GitHub
//! Enterprise and for tests.
//!
//! # Authentication
//!
//! The token is sent only via the `Authorization` header. Non-2xx
//! responses surface GitHub's `message` field when the body parses,
//! falling back to the raw status.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::traits::{
    AccountInfo, CreateRepoRequest, CreatedRepo, ForgeError, HostingProvider,
};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "gitvault";

/// GitHub hosting provider.
pub struct GitHubProvider {
    client: Client,
    token: String,
    api_base: String,
}

// Custom Debug to keep the token out of any formatted output.
impl std::fmt::Debug for GitHubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubProvider")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubProvider {
    /// Provider against the public GitHub API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Provider against a custom API base (Enterprise, tests).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| ForgeError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    async fn error_from(response: Response) -> ForgeError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ForgeError::AuthFailed(message)
        } else {
            ForgeError::ApiError {
                status: status.as_u16(),
                message,
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct UserBody {
    login: String,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Serialize)]
struct CreateRepoBody<'a> {
    name: &'a str,
    private: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Deserialize)]
struct RepoBody {
    full_name: String,
    html_url: String,
    clone_url: String,
    ssh_url: String,
    private: bool,
}

#[async_trait]
impl HostingProvider for GitHubProvider {
    async fn validate_token(&self) -> Result<AccountInfo, ForgeError> {
        let response = self
            .client
            .get(format!("{}/user", self.api_base))
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let user: UserBody = response
            .json()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Ok(AccountInfo {
            login: user.login,
            display_name: user.name,
            avatar_url: user.avatar_url,
        })
    }

    async fn create_repository(
        &self,
        request: CreateRepoRequest,
    ) -> Result<CreatedRepo, ForgeError> {
        let body = CreateRepoBody {
            name: &request.name,
            private: request.private,
            description: request.description.as_deref(),
        };
        let response = self
            .client
            .post(format!("{}/user/repos", self.api_base))
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let repo: RepoBody = response
            .json()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Ok(CreatedRepo {
            full_name: repo.full_name,
            web_url: repo.html_url,
            https_clone_url: repo.clone_url,
            ssh_url: repo.ssh_url,
            private: repo.private,
        })
    }
}
