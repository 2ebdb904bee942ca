//! provider::factory
//!
//! Provider selection and creation.
//!
//! # Design
//!
//! Callers construct providers through [`create_provider`] instead of
//! importing concrete adapter types, keeping the discovery pipeline
//! independent of any specific backend.

use super::github::GithubProvider;
use super::types::ScmProvider;

/// Supported SCM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// GitHub (github.com or GitHub Enterprise)
    GitHub,
}

impl ProviderKind {
    /// Get the backend name as a string.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::GitHub => "github",
        }
    }

    /// Parse a backend kind from a string.
    ///
    /// # Example
    ///
    /// ```
    /// use scm_discovery::provider::ProviderKind;
    ///
    /// assert_eq!(ProviderKind::parse("github"), Some(ProviderKind::GitHub));
    /// assert_eq!(ProviderKind::parse("unknown"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "github" => Some(ProviderKind::GitHub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Backend connection settings consumed when constructing a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Organization or namespace whose repositories are enumerated
    pub organization: String,
    /// Access credential; `None` for anonymous access where supported
    pub token: Option<String>,
    /// Optional enterprise/self-hosted API base URL
    pub api_base: Option<String>,
    /// Enumerate all branches instead of the default branch only
    pub all_branches: bool,
}

/// Create a provider for the given backend kind.
///
/// # Example
///
/// ```
/// use scm_discovery::provider::{create_provider, ProviderConfig, ProviderKind, ScmProvider};
///
/// let provider = create_provider(
///     ProviderKind::GitHub,
///     ProviderConfig {
///         organization: "acme".to_string(),
///         ..Default::default()
///     },
/// );
/// assert_eq!(provider.name(), "github");
/// ```
pub fn create_provider(kind: ProviderKind, config: ProviderConfig) -> Box<dyn ScmProvider> {
    match kind {
        ProviderKind::GitHub => match config.api_base {
            Some(base) => Box::new(GithubProvider::with_api_base(
                config.organization,
                config.token,
                config.all_branches,
                base,
            )),
            None => Box::new(GithubProvider::new(
                config.organization,
                config.token,
                config.all_branches,
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ProviderKind::parse("GitHub"), Some(ProviderKind::GitHub));
        assert_eq!(ProviderKind::parse("GITHUB"), Some(ProviderKind::GitHub));
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(ProviderKind::parse("sourcehut"), None);
    }

    #[test]
    fn display_matches_name() {
        assert_eq!(format!("{}", ProviderKind::GitHub), "github");
    }

    #[test]
    fn create_provider_builds_github() {
        let provider = create_provider(
            ProviderKind::GitHub,
            ProviderConfig {
                organization: "acme".into(),
                api_base: Some("https://github.example.com/api/v3".into()),
                ..Default::default()
            },
        );
        assert_eq!(provider.name(), "github");
    }
}
