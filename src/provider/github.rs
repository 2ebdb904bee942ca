//! provider::github
//!
//! GitHub adapter for the SCM provider contract, built on the REST API.
//!
//! # Design
//!
//! Repository listing paginates `GET /orgs/{org}/repos`, branch expansion
//! uses `GET /repos/{owner}/{repo}/branches` (or a single default-branch
//! lookup), and the path probe uses the contents endpoint with the branch as
//! `ref`. Pagination fetches pages of 100 until a short page arrives.
//!
//! # Authentication
//!
//! A bearer token is optional; anonymous requests work against public
//! organizations but are subject to much lower rate limits.
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This adapter returns [`ApiError::RateLimited`]
//! when limits are hit and does not retry; retry policy belongs to the
//! caller's transport configuration.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use super::types::{
    branch_revision, ApiError, CloneProtocol, ProviderError, Repository, ScmProvider,
};
use async_trait::async_trait;

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "scm-discovery";

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: u32 = 100;

/// GitHub implementation of [`ScmProvider`].
pub struct GithubProvider {
    /// HTTP client for making requests
    client: Client,
    /// Bearer token; `None` makes anonymous requests
    token: Option<String>,
    /// Organization whose repositories are enumerated
    organization: String,
    /// Enumerate every branch instead of just the default branch
    all_branches: bool,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GithubProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubProvider")
            .field("has_token", &self.token.is_some())
            .field("organization", &self.organization)
            .field("all_branches", &self.all_branches)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GithubProvider {
    /// Create a GitHub provider for `organization` against api.github.com.
    ///
    /// # Arguments
    ///
    /// * `organization` - Organization or user whose repositories to list
    /// * `token` - Personal access token; `None` for anonymous access
    /// * `all_branches` - Enumerate all branches rather than the default only
    pub fn new(organization: impl Into<String>, token: Option<String>, all_branches: bool) -> Self {
        Self {
            client: Client::new(),
            token,
            organization: organization.into(),
            all_branches,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Create a GitHub provider with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise installations
    /// (e.g., `https://github.example.com/api/v3`).
    pub fn with_api_base(
        organization: impl Into<String>,
        token: Option<String>,
        all_branches: bool,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token,
            organization: organization.into(),
            all_branches,
            api_base: api_base.into(),
        }
    }

    /// Get the configured organization.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::AuthFailed("token contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, repo: &Repository, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, repo.organization, repo.repository, path
        )
    }

    /// Issue a GET and map transport failures.
    async fn get(&self, url: &str) -> Result<Response, ApiError> {
        self.client
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    /// Parse a successful response body, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ApiError::Api {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_for(response, status).await)
        }
    }

    /// Map an error response to an [`ApiError`].
    async fn error_for(response: Response, status: StatusCode) -> ApiError {
        let message = match response.json::<GithubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ApiError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => ApiError::AuthFailed(format!("Permission denied: {}", message)),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
            _ if status.is_server_error() => ApiError::Api {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// List branches for a repository.
    ///
    /// Default-branch-only mode looks up the single branch recorded on the
    /// repository; a 404 there means the repository is empty and yields an
    /// empty list. All-branches mode paginates the branch list endpoint.
    async fn list_branches(&self, repo: &Repository) -> Result<Vec<GithubBranch>, ApiError> {
        if !self.all_branches {
            let url = self.repo_url(repo, &format!("branches/{}", repo.branch));
            let response = self.get(&url).await?;
            if response.status() == StatusCode::NOT_FOUND {
                // Default branch doesn't exist, so the repo is empty.
                return Ok(Vec::new());
            }
            let branch: GithubBranch = self.handle_response(response).await?;
            return Ok(vec![branch]);
        }

        let mut branches = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = self.repo_url(
                repo,
                &format!("branches?per_page={}&page={}", PER_PAGE, page),
            );
            let response = self.get(&url).await?;
            let page_branches: Vec<GithubBranch> = self.handle_response(response).await?;
            let page_count = page_branches.len();
            branches.extend(page_branches);
            if page_count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }
        Ok(branches)
    }
}

#[async_trait]
impl ScmProvider for GithubProvider {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_repos(
        &self,
        clone_protocol: CloneProtocol,
    ) -> Result<Vec<Repository>, ProviderError> {
        let mut repos = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = format!(
                "{}/orgs/{}/repos?per_page={}&page={}",
                self.api_base, self.organization, PER_PAGE, page
            );
            let response = self
                .get(&url)
                .await
                .map_err(|e| ProviderError::org(&self.organization, e))?;
            let page_repos: Vec<GithubRepo> = self
                .handle_response(response)
                .await
                .map_err(|e| ProviderError::org(&self.organization, e))?;
            let page_count = page_repos.len();

            for gh in page_repos {
                let url = match clone_protocol {
                    CloneProtocol::Ssh => gh.ssh_url,
                    CloneProtocol::Https => gh.clone_url,
                };
                repos.push(Repository {
                    organization: gh.owner.login,
                    repository: gh.name,
                    url,
                    branch: gh.default_branch,
                    revision: String::new(),
                    labels: gh.topics,
                    id: gh.id.into(),
                });
            }

            if page_count < PER_PAGE as usize {
                break;
            }
            page += 1;
        }
        Ok(repos)
    }

    async fn get_branches(&self, repo: &Repository) -> Result<Vec<Repository>, ProviderError> {
        let branches = self
            .list_branches(repo)
            .await
            .map_err(|e| ProviderError::repo(repo, e))?;

        Ok(branches
            .into_iter()
            .map(|branch| Repository {
                organization: repo.organization.clone(),
                repository: repo.repository.clone(),
                url: repo.url.clone(),
                revision: branch_revision(&branch.name, &branch.commit.sha),
                branch: branch.name,
                labels: repo.labels.clone(),
                id: repo.id.clone(),
            })
            .collect())
    }

    async fn repo_has_path(&self, repo: &Repository, path: &str) -> Result<bool, ProviderError> {
        let url = self.repo_url(repo, &format!("contents/{}?ref={}", path, repo.branch));
        let response = self
            .get(&url)
            .await
            .map_err(|e| ProviderError::repo(repo, e))?;
        let status = response.status();
        // 404s are not an error here, just a normal false.
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if status.is_success() {
            return Ok(true);
        }
        Err(ProviderError::repo(
            repo,
            Self::error_for(response, status).await,
        ))
    }
}

// --------------------------------------------------------------------------
// API Response Types
// --------------------------------------------------------------------------

/// GitHub error response format.
#[derive(Deserialize)]
struct GithubErrorResponse {
    message: String,
}

/// GitHub repository list item (subset of the full response).
#[derive(Deserialize)]
struct GithubRepo {
    id: i64,
    name: String,
    owner: GithubOwner,
    ssh_url: String,
    clone_url: String,
    default_branch: String,
    #[serde(default)]
    topics: Vec<String>,
}

/// Minimal GitHub owner info.
#[derive(Deserialize)]
struct GithubOwner {
    login: String,
}

/// GitHub branch response format.
#[derive(Deserialize)]
struct GithubBranch {
    name: String,
    commit: GithubCommitRef,
}

/// Head commit reference on a branch.
#[derive(Deserialize)]
struct GithubCommitRef {
    sha: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_creates_provider() {
        let provider = GithubProvider::new("acme", Some("token".into()), false);
        assert_eq!(provider.name(), "github");
        assert_eq!(provider.organization(), "acme");
        assert_eq!(provider.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn with_api_base_overrides_default() {
        let provider = GithubProvider::with_api_base(
            "acme",
            None,
            true,
            "https://github.example.com/api/v3",
        );
        assert_eq!(provider.api_base, "https://github.example.com/api/v3");
        assert!(provider.all_branches);
    }

    #[test]
    fn debug_redacts_token() {
        let provider = GithubProvider::new("acme", Some("secret_token_abc123".into()), false);
        let debug_output = format!("{:?}", provider);
        assert!(!debug_output.contains("secret_token_abc123"));
        assert!(debug_output.contains("has_token"));
    }

    #[test]
    fn repo_url_format() {
        let provider = GithubProvider::new("acme", None, false);
        let repo = Repository {
            organization: "acme".into(),
            repository: "widgets".into(),
            branch: "main".into(),
            ..Default::default()
        };
        assert_eq!(
            provider.repo_url(&repo, "branches/main"),
            "https://api.github.com/repos/acme/widgets/branches/main"
        );
    }

    #[test]
    fn anonymous_headers_have_no_authorization() {
        let provider = GithubProvider::new("acme", None, false);
        let headers = provider.headers().unwrap();
        assert!(!headers.contains_key(AUTHORIZATION));
        assert!(headers.contains_key(USER_AGENT));
    }

    #[test]
    fn token_headers_carry_bearer() {
        let provider = GithubProvider::new("acme", Some("tok".into()), false);
        let headers = provider.headers().unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }
}
