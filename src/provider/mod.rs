//! provider
//!
//! Capability contract for SCM backends.
//!
//! # Architecture
//!
//! The [`ScmProvider`] trait defines the three operations the discovery
//! pipeline needs from a backend: repository listing, branch expansion, and
//! a path-existence probe. One implementation exists per vendor; the
//! pipeline and filter engine depend only on the trait.
//!
//! # Modules
//!
//! - `types`: Core `ScmProvider` trait, the `Repository` record, and errors
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Backend selection and creation

mod factory;
pub mod github;
pub mod mock;
mod types;

pub use factory::{create_provider, ProviderConfig, ProviderKind};
pub use types::*;
