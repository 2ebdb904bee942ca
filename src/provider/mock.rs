//! provider::mock
//!
//! Mock SCM provider for deterministic testing.
//!
//! # Design
//!
//! The mock provider stores repositories, branches, and existing paths in
//! memory, records every operation for later verification, and allows
//! configuring failure scenarios per operation.
//!
//! # Example
//!
//! ```
//! use scm_discovery::provider::mock::MockProvider;
//! use scm_discovery::provider::{CloneProtocol, Repository, ScmProvider};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new();
//! provider.add_repo(Repository {
//!     organization: "acme".to_string(),
//!     repository: "widgets".to_string(),
//!     branch: "main".to_string(),
//!     ..Default::default()
//! });
//! provider.add_branch("widgets", "main", "a1b2c3d4e5f6");
//!
//! let repos = provider.list_repos(CloneProtocol::Ssh).await.unwrap();
//! assert_eq!(repos.len(), 1);
//!
//! let branches = provider.get_branches(&repos[0]).await.unwrap();
//! assert_eq!(branches[0].revision, "main-a1b2c3");
//! # });
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::types::{branch_revision, CloneProtocol, ProviderError, Repository, ScmProvider};

/// Mock provider for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockProviderInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockProviderInner {
    /// Repositories returned by list_repos, in insertion order.
    repos: Vec<Repository>,
    /// Branches per repository name: (branch name, head commit id).
    branches: HashMap<String, Vec<(String, String)>>,
    /// Paths that exist, keyed by (repository name, branch, path).
    paths: HashSet<(String, String, String)>,
    /// Operation to fail on (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail list_repos with the given error.
    ListRepos(ProviderError),
    /// Fail get_branches for the named repository with the given error.
    GetBranches(String, ProviderError),
    /// Fail repo_has_path for the given path with the given error.
    RepoHasPath(String, ProviderError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq)]
pub enum MockOperation {
    ListRepos {
        clone_protocol: CloneProtocol,
    },
    GetBranches {
        repository: String,
    },
    RepoHasPath {
        repository: String,
        branch: String,
        path: String,
    },
}

impl MockProvider {
    /// Create a new empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a repository to the listing.
    ///
    /// `branch` should hold the default branch name, as a real adapter's
    /// listing would return it.
    pub fn add_repo(&self, repo: Repository) {
        self.inner.lock().unwrap().repos.push(repo);
    }

    /// Register a branch with its head commit id for a repository.
    pub fn add_branch(&self, repository: &str, branch: &str, head_commit: &str) {
        self.inner
            .lock()
            .unwrap()
            .branches
            .entry(repository.to_string())
            .or_default()
            .push((branch.to_string(), head_commit.to_string()));
    }

    /// Register a path as existing in a repository at a branch.
    pub fn add_path(&self, repository: &str, branch: &str, path: &str) {
        self.inner.lock().unwrap().paths.insert((
            repository.to_string(),
            branch.to_string(),
            path.to_string(),
        ));
    }

    /// Configure an operation to fail.
    pub fn fail_on(&self, fail: FailOn) {
        self.inner.lock().unwrap().fail_on = Some(fail);
    }

    /// Get the recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Count recorded path probes.
    pub fn path_probe_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| matches!(op, MockOperation::RepoHasPath { .. }))
            .count()
    }
}

#[async_trait]
impl ScmProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_repos(
        &self,
        clone_protocol: CloneProtocol,
    ) -> Result<Vec<Repository>, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .operations
            .push(MockOperation::ListRepos { clone_protocol });
        if let Some(FailOn::ListRepos(err)) = &inner.fail_on {
            return Err(err.clone());
        }
        Ok(inner.repos.clone())
    }

    async fn get_branches(&self, repo: &Repository) -> Result<Vec<Repository>, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::GetBranches {
            repository: repo.repository.clone(),
        });
        if let Some(FailOn::GetBranches(name, err)) = &inner.fail_on {
            if *name == repo.repository {
                return Err(err.clone());
            }
        }
        let branches = inner
            .branches
            .get(&repo.repository)
            .cloned()
            .unwrap_or_default();
        Ok(branches
            .into_iter()
            .map(|(name, head)| Repository {
                organization: repo.organization.clone(),
                repository: repo.repository.clone(),
                url: repo.url.clone(),
                revision: branch_revision(&name, &head),
                branch: name,
                labels: repo.labels.clone(),
                id: repo.id.clone(),
            })
            .collect())
    }

    async fn repo_has_path(&self, repo: &Repository, path: &str) -> Result<bool, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(MockOperation::RepoHasPath {
            repository: repo.repository.clone(),
            branch: repo.branch.clone(),
            path: path.to_string(),
        });
        if let Some(FailOn::RepoHasPath(p, err)) = &inner.fail_on {
            if *p == path {
                return Err(err.clone());
            }
        }
        Ok(inner.paths.contains(&(
            repo.repository.clone(),
            repo.branch.clone(),
            path.to_string(),
        )))
    }
}
