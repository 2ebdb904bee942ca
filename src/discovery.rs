//! discovery
//!
//! The two-phase discover pipeline.
//!
//! # Design
//!
//! A single invocation runs two sequential phases:
//!
//! 1. **Repo phase**: enumerate every repository visible to the provider and
//!    keep those matching the repo-level filter view (filters without a
//!    branch constraint). An empty view keeps everything.
//! 2. **Branch phase**: expand each surviving repository into its branch
//!    records and keep those matching the branch-level filter view. An empty
//!    view keeps everything.
//!
//! Filtering at the repository level before branch expansion is deliberate:
//! branch enumeration is the most expensive call per repository (full
//! pagination against a rate-limited backend), and repositories that cannot
//! survive the final filter set never pay it.
//!
//! Configuration errors (bad regex, unknown clone protocol) are detected
//! before any network call. The first error anywhere aborts the invocation;
//! no partial results are returned.

use thiserror::Error;

use crate::filter::{matches_any, FilterCompileError, FilterSpec, Filters};
use crate::provider::{CloneProtocol, ProviderError, Repository, ScmProvider};

/// Errors surfaced by [`discover`].
#[derive(Debug, Clone, Error)]
pub enum DiscoveryError {
    /// A declarative filter pattern failed to compile.
    #[error(transparent)]
    FilterCompile(#[from] FilterCompileError),

    /// The provider rejected the configuration or a backend call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Discover the (repository, branch) records matching `specs`.
///
/// `clone_protocol` is the declarative selector: `""` or `"ssh"` for SSH
/// clone URLs, `"https"` for HTTPS. Input order is preserved through both
/// phases; every returned record has `branch` and `revision` populated.
///
/// # Errors
///
/// - [`DiscoveryError::FilterCompile`] when a pattern in `specs` is invalid
/// - [`DiscoveryError::Provider`] for an unsupported clone protocol or any
///   backend failure, carrying the organization/repository being processed
pub async fn discover(
    provider: &dyn ScmProvider,
    specs: &[FilterSpec],
    clone_protocol: &str,
) -> Result<Vec<Repository>, DiscoveryError> {
    // Validate configuration before touching the network.
    let protocol: CloneProtocol = clone_protocol.parse().map_err(|e: ProviderError| {
        tracing::error!(provider = provider.name(), %clone_protocol, "invalid clone protocol");
        e
    })?;
    let filters = Filters::compile(specs).map_err(|e| {
        tracing::error!(field = e.field, pattern = %e.pattern, "filter compilation failed");
        e
    })?;

    tracing::debug!(
        provider = provider.name(),
        filters = filters.len(),
        %protocol,
        "starting repository discovery"
    );

    let repos = provider.list_repos(protocol).await.map_err(|e| {
        tracing::error!(provider = provider.name(), "repository listing failed");
        e
    })?;
    let surviving = filter_repos(provider, repos, &filters).await?;

    tracing::debug!(surviving = surviving.len(), "repo phase complete");

    let result = expand_branches(provider, surviving, &filters).await?;

    tracing::debug!(records = result.len(), "branch phase complete");
    Ok(result)
}

/// Repo phase: keep repositories matching the repo-level filter view.
async fn filter_repos(
    provider: &dyn ScmProvider,
    repos: Vec<Repository>,
    filters: &Filters,
) -> Result<Vec<Repository>, DiscoveryError> {
    let repo_filters = filters.repo_filters();
    if repo_filters.is_empty() {
        return Ok(repos);
    }

    let mut surviving = Vec::with_capacity(repos.len());
    for repo in repos {
        if matches_any(&repo_filters, provider, &repo).await? {
            surviving.push(repo);
        }
    }
    Ok(surviving)
}

/// Branch phase: expand survivors into branch records and keep those
/// matching the branch-level filter view.
async fn expand_branches(
    provider: &dyn ScmProvider,
    repos: Vec<Repository>,
    filters: &Filters,
) -> Result<Vec<Repository>, DiscoveryError> {
    let mut expanded = Vec::new();
    for repo in &repos {
        let branches = provider.get_branches(repo).await.map_err(|e| {
            tracing::error!(
                organization = %repo.organization,
                repository = %repo.repository,
                "branch expansion failed"
            );
            e
        })?;
        expanded.extend(branches);
    }

    let branch_filters = filters.branch_filters();
    if branch_filters.is_empty() {
        return Ok(expanded);
    }

    let mut surviving = Vec::with_capacity(expanded.len());
    for repo in expanded {
        if matches_any(&branch_filters, provider, &repo).await? {
            surviving.push(repo);
        }
    }
    Ok(surviving)
}
