//! filter
//!
//! Declarative filter specs and their compiled matchers.
//!
//! # Design
//!
//! A [`FilterSpec`] is a conjunction of optional conditions; absent fields
//! do not constrain. Specs are compiled once per pipeline invocation into
//! immutable [`Filter`] values holding compiled regexes; compilation fails
//! fast on the first bad pattern, naming the field and the pattern.
//!
//! A repository matches a [`Filters`] collection when it matches at least
//! one filter in it (OR across filters, AND within a filter). An empty
//! collection matches everything.
//!
//! The collection is split into two views by whether `branch_match` is set:
//! filters without it are evaluable before branches are known (repository
//! name, labels, path probes against the default branch); filters with it
//! can only run after branch expansion, where their remaining conditions
//! are re-checked against the expanded record.

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::provider::{ProviderError, Repository, ScmProvider};

/// A declarative filter as supplied by the caller.
///
/// Every field is independently optional; a spec with no fields set matches
/// every repository.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Regex constraint on the repository name
    pub repository_match: Option<String>,
    /// Regex constraint on labels; matches when any label matches
    pub label_match: Option<String>,
    /// Paths that must all exist in the repository at the branch
    pub paths_exist: Vec<String>,
    /// Regex constraint on the branch name; forces branch-level evaluation
    pub branch_match: Option<String>,
}

/// A filter pattern failed to compile.
///
/// Compilation stops at the first failure; `field` and `pattern` identify
/// the offending spec entry.
#[derive(Debug, Clone, Error)]
#[error("error compiling {field} regexp {pattern:?}: {source}")]
pub struct FilterCompileError {
    /// Spec field whose pattern failed (`repositoryMatch`, `labelMatch`,
    /// or `branchMatch`)
    pub field: &'static str,
    /// The pattern string that failed to compile
    pub pattern: String,
    /// The regex compilation failure
    #[source]
    pub source: regex::Error,
}

/// A compiled filter: a conjunction of optional conditions.
#[derive(Debug, Clone)]
pub struct Filter {
    repository_match: Option<Regex>,
    label_match: Option<Regex>,
    paths_exist: Vec<String>,
    branch_match: Option<Regex>,
}

impl Filter {
    fn compile(spec: &FilterSpec) -> Result<Self, FilterCompileError> {
        Ok(Filter {
            repository_match: compile_field("repositoryMatch", &spec.repository_match)?,
            label_match: compile_field("labelMatch", &spec.label_match)?,
            paths_exist: spec.paths_exist.clone(),
            branch_match: compile_field("branchMatch", &spec.branch_match)?,
        })
    }

    /// Whether this filter requires branch enumeration to evaluate.
    pub fn is_branch_level(&self) -> bool {
        self.branch_match.is_some()
    }

    /// Evaluate this filter against a repository record.
    ///
    /// Every set condition must hold; unset conditions are vacuously true.
    /// Path probes run last and short-circuit on the first missing path;
    /// probe failures propagate immediately.
    pub async fn matches(
        &self,
        provider: &dyn ScmProvider,
        repo: &Repository,
    ) -> Result<bool, ProviderError> {
        if let Some(ref re) = self.repository_match {
            if !re.is_match(&repo.repository) {
                return Ok(false);
            }
        }

        if let Some(ref re) = self.branch_match {
            if !re.is_match(&repo.branch) {
                return Ok(false);
            }
        }

        if let Some(ref re) = self.label_match {
            if !repo.labels.iter().any(|label| re.is_match(label)) {
                return Ok(false);
            }
        }

        for path in &self.paths_exist {
            if !provider.repo_has_path(repo, path).await? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

fn compile_field(
    field: &'static str,
    pattern: &Option<String>,
) -> Result<Option<Regex>, FilterCompileError> {
    match pattern {
        None => Ok(None),
        Some(p) => Regex::new(p).map(Some).map_err(|source| FilterCompileError {
            field,
            pattern: p.clone(),
            source,
        }),
    }
}

/// An ordered collection of compiled filters.
#[derive(Debug, Clone, Default)]
pub struct Filters(Vec<Filter>);

impl Filters {
    /// Compile a sequence of declarative specs.
    ///
    /// Fails on the first bad pattern; no partial compilation is attempted.
    pub fn compile(specs: &[FilterSpec]) -> Result<Self, FilterCompileError> {
        specs.iter().map(Filter::compile).collect::<Result<_, _>>().map(Filters)
    }

    /// Filters evaluable before branches are known.
    pub fn repo_filters(&self) -> Vec<&Filter> {
        self.0.iter().filter(|f| !f.is_branch_level()).collect()
    }

    /// Filters requiring branch enumeration to evaluate.
    pub fn branch_filters(&self) -> Vec<&Filter> {
        self.0.iter().filter(|f| f.is_branch_level()).collect()
    }

    /// Total number of compiled filters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no filters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Evaluate a repository against a filter view.
///
/// Matches when at least one filter in `view` matches. Callers handle the
/// empty-view case (match everything) before calling; an empty view here
/// matches nothing, mirroring the OR semantics literally.
pub(crate) async fn matches_any(
    view: &[&Filter],
    provider: &dyn ScmProvider,
    repo: &Repository,
) -> Result<bool, ProviderError> {
    for filter in view {
        if filter.matches(provider, repo).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;

    fn repo(name: &str, branch: &str, labels: &[&str]) -> Repository {
        Repository {
            organization: "acme".into(),
            repository: name.into(),
            branch: branch.into(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn spec(
        repository_match: Option<&str>,
        label_match: Option<&str>,
        paths_exist: &[&str],
        branch_match: Option<&str>,
    ) -> FilterSpec {
        FilterSpec {
            repository_match: repository_match.map(String::from),
            label_match: label_match.map(String::from),
            paths_exist: paths_exist.iter().map(|s| s.to_string()).collect(),
            branch_match: branch_match.map(String::from),
        }
    }

    mod compile {
        use super::*;

        #[test]
        fn empty_spec_list_compiles_to_empty_filters() {
            let filters = Filters::compile(&[]).unwrap();
            assert!(filters.is_empty());
            assert!(filters.repo_filters().is_empty());
            assert!(filters.branch_filters().is_empty());
        }

        #[test]
        fn bad_repository_pattern_names_field_and_pattern() {
            let err = Filters::compile(&[spec(Some("*invalid"), None, &[], None)]).unwrap_err();
            assert_eq!(err.field, "repositoryMatch");
            assert_eq!(err.pattern, "*invalid");
        }

        #[test]
        fn bad_label_pattern_names_field() {
            let err = Filters::compile(&[spec(None, Some("(unclosed"), &[], None)]).unwrap_err();
            assert_eq!(err.field, "labelMatch");
            assert_eq!(err.pattern, "(unclosed");
        }

        #[test]
        fn bad_branch_pattern_names_field() {
            let err = Filters::compile(&[spec(None, None, &[], Some("[z-a]"))]).unwrap_err();
            assert_eq!(err.field, "branchMatch");
        }

        #[test]
        fn stops_at_first_failure() {
            let specs = [
                spec(Some("*first"), None, &[], None),
                spec(Some("*second"), None, &[], None),
            ];
            let err = Filters::compile(&specs).unwrap_err();
            assert_eq!(err.pattern, "*first");
        }

        #[test]
        fn absent_fields_are_not_compiled() {
            let filters = Filters::compile(&[spec(None, None, &[], None)]).unwrap();
            let f = &filters.repo_filters()[0];
            assert!(f.repository_match.is_none());
            assert!(f.label_match.is_none());
            assert!(f.branch_match.is_none());
            assert!(f.paths_exist.is_empty());
        }
    }

    mod views {
        use super::*;

        #[test]
        fn branch_match_selects_branch_view() {
            let filters = Filters::compile(&[
                spec(Some("^api-"), None, &[], None),
                spec(None, None, &[], Some("^release-")),
                spec(Some("^web-"), None, &[], Some("^main$")),
            ])
            .unwrap();

            assert_eq!(filters.len(), 3);
            assert_eq!(filters.repo_filters().len(), 1);
            assert_eq!(filters.branch_filters().len(), 2);
        }

        #[test]
        fn every_filter_lands_in_exactly_one_view() {
            let filters = Filters::compile(&[
                spec(Some("a"), Some("b"), &["c"], None),
                spec(None, None, &[], Some("d")),
            ])
            .unwrap();
            assert_eq!(
                filters.repo_filters().len() + filters.branch_filters().len(),
                filters.len()
            );
        }
    }

    mod matching {
        use super::*;

        #[tokio::test]
        async fn vacuous_filter_matches_everything() {
            let provider = MockProvider::new();
            let filters = Filters::compile(&[spec(None, None, &[], None)]).unwrap();
            let f = &filters.repo_filters()[0];
            assert!(f
                .matches(&provider, &repo("anything", "any", &[]))
                .await
                .unwrap());
        }

        #[tokio::test]
        async fn repository_match_constrains_name() {
            let provider = MockProvider::new();
            let filters = Filters::compile(&[spec(Some("^api-.*"), None, &[], None)]).unwrap();
            let f = &filters.repo_filters()[0];

            assert!(f
                .matches(&provider, &repo("api-gateway", "main", &[]))
                .await
                .unwrap());
            assert!(!f
                .matches(&provider, &repo("web-ui", "main", &[]))
                .await
                .unwrap());
        }

        #[tokio::test]
        async fn branch_match_constrains_branch() {
            let provider = MockProvider::new();
            let filters = Filters::compile(&[spec(None, None, &[], Some("^release-.*"))]).unwrap();
            let f = &filters.branch_filters()[0];

            assert!(f
                .matches(&provider, &repo("svc", "release-1.0", &[]))
                .await
                .unwrap());
            assert!(!f.matches(&provider, &repo("svc", "main", &[])).await.unwrap());
        }

        #[tokio::test]
        async fn label_match_needs_any_label() {
            let provider = MockProvider::new();
            let filters = Filters::compile(&[spec(None, Some("^deploy$"), &[], None)]).unwrap();
            let f = &filters.repo_filters()[0];

            assert!(f
                .matches(&provider, &repo("svc", "main", &["infra", "deploy"]))
                .await
                .unwrap());
            assert!(!f
                .matches(&provider, &repo("svc", "main", &["infra"]))
                .await
                .unwrap());
            assert!(!f.matches(&provider, &repo("svc", "main", &[])).await.unwrap());
        }

        #[tokio::test]
        async fn paths_exist_requires_all_paths() {
            let provider = MockProvider::new();
            provider.add_path("svc", "main", "Chart.yaml");
            let filters =
                Filters::compile(&[spec(None, None, &["Chart.yaml", "values.yaml"], None)])
                    .unwrap();
            let f = &filters.repo_filters()[0];

            assert!(!f.matches(&provider, &repo("svc", "main", &[])).await.unwrap());

            provider.add_path("svc", "main", "values.yaml");
            assert!(f.matches(&provider, &repo("svc", "main", &[])).await.unwrap());
        }

        #[tokio::test]
        async fn path_probe_short_circuits_on_first_miss() {
            let provider = MockProvider::new();
            // Neither path exists; the second must never be probed.
            let filters =
                Filters::compile(&[spec(None, None, &["first.yaml", "second.yaml"], None)])
                    .unwrap();
            let f = &filters.repo_filters()[0];

            assert!(!f.matches(&provider, &repo("svc", "main", &[])).await.unwrap());
            assert_eq!(provider.path_probe_count(), 1);
        }

        #[tokio::test]
        async fn probe_error_propagates() {
            use crate::provider::mock::FailOn;
            use crate::provider::{ApiError, ProviderError};

            let provider = MockProvider::new();
            provider.fail_on(FailOn::RepoHasPath(
                "broken.yaml".into(),
                ProviderError::org("acme", ApiError::RateLimited),
            ));
            let filters = Filters::compile(&[spec(None, None, &["broken.yaml"], None)]).unwrap();
            let f = &filters.repo_filters()[0];

            assert!(f.matches(&provider, &repo("svc", "main", &[])).await.is_err());
        }

        #[tokio::test]
        async fn conditions_combine_as_conjunction() {
            let provider = MockProvider::new();
            let filters =
                Filters::compile(&[spec(Some("^api-"), Some("deploy"), &[], None)]).unwrap();
            let f = &filters.repo_filters()[0];

            assert!(f
                .matches(&provider, &repo("api-gateway", "main", &["deploy"]))
                .await
                .unwrap());
            // Name matches but label doesn't.
            assert!(!f
                .matches(&provider, &repo("api-gateway", "main", &["infra"]))
                .await
                .unwrap());
            // Label matches but name doesn't.
            assert!(!f
                .matches(&provider, &repo("web-ui", "main", &["deploy"]))
                .await
                .unwrap());
        }
    }

    mod deserialization {
        use super::*;

        #[test]
        fn camel_case_fields() {
            let json = r#"{
                "repositoryMatch": "^api-.*",
                "labelMatch": "deploy",
                "pathsExist": ["kustomization.yaml"],
                "branchMatch": "^env/.*"
            }"#;
            let spec: FilterSpec = serde_json::from_str(json).unwrap();
            assert_eq!(spec.repository_match.as_deref(), Some("^api-.*"));
            assert_eq!(spec.label_match.as_deref(), Some("deploy"));
            assert_eq!(spec.paths_exist, vec!["kustomization.yaml"]);
            assert_eq!(spec.branch_match.as_deref(), Some("^env/.*"));
        }

        #[test]
        fn all_fields_optional() {
            let spec: FilterSpec = serde_json::from_str("{}").unwrap();
            assert!(spec.repository_match.is_none());
            assert!(spec.label_match.is_none());
            assert!(spec.paths_exist.is_empty());
            assert!(spec.branch_match.is_none());
        }
    }
}
