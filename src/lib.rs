//! scm-discovery - Repository and branch discovery for SCM backends
//!
//! This crate discovers the repositories and branches hosted on a remote
//! source-control platform and selects the subset matching a declarative set
//! of filters, producing a flat list of (repository, branch) records for
//! downstream manifest generation.
//!
//! # Architecture
//!
//! - [`provider`] - Capability contract for SCM backends plus the GitHub
//!   reference adapter and a deterministic mock
//! - [`filter`] - Declarative filter specs and their compiled matchers
//! - [`discovery`] - The two-phase discover pipeline: enumerate repositories,
//!   filter at the repository level, expand to branches, filter at the
//!   branch level
//!
//! # Correctness Invariants
//!
//! 1. Configuration errors (bad regex, unknown clone protocol) are detected
//!    before any network call is made
//! 2. Input order is preserved through both pipeline phases
//! 3. The first backend error aborts the whole invocation; no partial
//!    results are ever returned
//!
//! # Example
//!
//! ```ignore
//! use scm_discovery::discovery::discover;
//! use scm_discovery::filter::FilterSpec;
//! use scm_discovery::provider::github::GithubProvider;
//!
//! let provider = GithubProvider::new("my-org", Some("token".into()), false);
//! let specs = vec![FilterSpec {
//!     repository_match: Some("^api-.*".into()),
//!     ..Default::default()
//! }];
//! let repos = discover(&provider, &specs, "ssh").await?;
//! for repo in repos {
//!     println!("{}/{} @ {} ({})", repo.organization, repo.repository, repo.branch, repo.revision);
//! }
//! ```

pub mod discovery;
pub mod filter;
pub mod provider;

pub use discovery::{discover, DiscoveryError};
pub use filter::{Filter, FilterCompileError, FilterSpec, Filters};
pub use provider::{CloneProtocol, ProviderError, Repository, RepositoryId, ScmProvider};
