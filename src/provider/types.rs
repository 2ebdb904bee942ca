//! provider::types
//!
//! The SCM provider capability contract and the types that cross it.
//!
//! # Design
//!
//! The `ScmProvider` trait is async because every operation involves network
//! I/O against a remote SCM API. The trait is deliberately small: listing
//! repositories, expanding a repository into branches, and probing for a
//! path. The discovery pipeline depends only on this trait, never on a
//! concrete backend.
//!
//! Two "not found" responses are modeled as values, not errors:
//! - a missing default branch means the repository is empty and expands to
//!   zero branch records
//! - a missing path is an ordinary `false` from the path probe
//!
//! Everything else from the backend surfaces as a [`ProviderError`] carrying
//! the organization/repository that was being processed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Transport-level errors from an SCM backend API.
///
/// These map the common failure modes of hosted SCM services. Adapters
/// translate HTTP status codes into these variants before attaching
/// repository context via [`ProviderError::Backend`].
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    ///
    /// Adapters only surface this for resources whose absence is a real
    /// failure; missing default branches and missing paths are handled
    /// in-adapter and never reach callers as errors.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    Network(String),
}

/// Errors from SCM provider operations.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The configured clone protocol is not one of `""`, `"ssh"`, `"https"`.
    #[error("unknown clone protocol {value:?}")]
    UnsupportedProtocol {
        /// The rejected selector value
        value: String,
    },

    /// A backend API call failed.
    ///
    /// `repository` is empty for organization-level operations such as
    /// repository listing.
    #[error("backend error for {organization}/{repository}: {source}")]
    Backend {
        /// Organization or namespace being processed
        organization: String,
        /// Repository being processed (empty at the organization level)
        repository: String,
        /// The underlying API failure
        #[source]
        source: ApiError,
    },
}

impl ProviderError {
    /// Wrap a transport error with organization-level context.
    pub fn org(organization: impl Into<String>, source: ApiError) -> Self {
        ProviderError::Backend {
            organization: organization.into(),
            repository: String::new(),
            source,
        }
    }

    /// Wrap a transport error with repository-level context.
    pub fn repo(repo: &Repository, source: ApiError) -> Self {
        ProviderError::Backend {
            organization: repo.organization.clone(),
            repository: repo.repository.clone(),
            source,
        }
    }
}

/// Which clone URL form a backend should return for discovered repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneProtocol {
    /// SSH clone URL (the default when the selector is empty)
    #[default]
    Ssh,
    /// HTTPS clone URL
    Https,
}

impl FromStr for CloneProtocol {
    type Err = ProviderError;

    /// Parse the declarative selector. `""` and `"ssh"` select SSH,
    /// `"https"` selects HTTPS; anything else is an unsupported protocol.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "ssh" => Ok(CloneProtocol::Ssh),
            "https" => Ok(CloneProtocol::Https),
            other => Err(ProviderError::UnsupportedProtocol {
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CloneProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloneProtocol::Ssh => write!(f, "ssh"),
            CloneProtocol::Https => write!(f, "https"),
        }
    }
}

/// Backend-specific repository identifier.
///
/// GitHub uses numeric ids; other backends use opaque strings. Kept as a
/// small enum so the numeric form survives losslessly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RepositoryId {
    /// Numeric identifier (GitHub)
    Int(i64),
    /// Opaque string identifier
    Text(String),
}

impl Default for RepositoryId {
    fn default() -> Self {
        RepositoryId::Text(String::new())
    }
}

impl From<i64> for RepositoryId {
    fn from(id: i64) -> Self {
        RepositoryId::Int(id)
    }
}

impl From<String> for RepositoryId {
    fn from(id: String) -> Self {
        RepositoryId::Text(id)
    }
}

impl std::fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryId::Int(id) => write!(f, "{}", id),
            RepositoryId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// One (repository, branch) unit of work flowing through the pipeline.
///
/// Before branch expansion `branch` holds the backend's default branch and
/// `revision` is empty; after expansion every record has `branch` and
/// `revision` populated, one record per branch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Repository {
    /// Organization or namespace owning the repository
    pub organization: String,
    /// Repository name
    pub repository: String,
    /// Clone URL in the configured protocol
    pub url: String,
    /// Branch name (default branch until expansion)
    pub branch: String,
    /// Environment-safe identifier derived from the branch name and head
    /// commit; empty until branch expansion
    pub revision: String,
    /// Labels/topics attached to the repository
    pub labels: Vec<String>,
    /// Backend-specific repository id
    pub id: RepositoryId,
}

/// Derive the environment-safe revision for a branch.
///
/// The branch name is lowercased with every non-word character (anything
/// outside letters, digits, and underscore) stripped, then suffixed with a
/// hyphen and the first 6 characters of the head commit id (the whole id
/// when it is shorter than 7 characters). The result is unique per branch
/// and traceable back to both the branch and the commit.
///
/// # Example
///
/// ```
/// use scm_discovery::provider::branch_revision;
///
/// let rev = branch_revision("Feature/ABC-123!", "a1b2c3d4e5f6a7b8");
/// assert_eq!(rev, "featureabc123-a1b2c3");
/// ```
pub fn branch_revision(branch: &str, head_commit: &str) -> String {
    // Lowercase before stripping: lowercasing can expand a character into
    // several (e.g. U+0130 becomes "i" plus a combining mark), and any
    // non-word character in that expansion must be stripped too.
    let normalized: String = branch
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let short = if head_commit.len() >= 7 {
        &head_commit[..6]
    } else {
        head_commit
    };
    format!("{}-{}", normalized, short)
}

/// The capability contract every SCM backend adapter implements.
///
/// One implementation exists per SCM vendor; the discovery pipeline and the
/// filter matcher depend only on this trait.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait ScmProvider: Send + Sync {
    /// Get the provider name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Enumerate every repository visible to the configured credentials and
    /// organization, fully paginating the backend API.
    ///
    /// Each record carries the organization, repository name, clone URL in
    /// the requested protocol, the default branch, labels, and the backend
    /// repository id. `revision` is left empty.
    async fn list_repos(
        &self,
        clone_protocol: CloneProtocol,
    ) -> Result<Vec<Repository>, ProviderError>;

    /// Expand one repository into one record per relevant branch.
    ///
    /// In default-branch-only mode this returns exactly one record, or zero
    /// records when the backend reports the default branch missing (an empty
    /// repository, not an error). In all-branches mode the full branch list
    /// is paginated. Every returned record has `revision` populated via
    /// [`branch_revision`].
    async fn get_branches(&self, repo: &Repository) -> Result<Vec<Repository>, ProviderError>;

    /// Probe whether `path` exists in `repo` at `repo.branch`.
    ///
    /// A backend "not found" response is an ordinary `Ok(false)`.
    async fn repo_has_path(&self, repo: &Repository, path: &str) -> Result<bool, ProviderError>;
}
