//! Whitelist / blacklist selection of indexed repositories

use crate::policy::ReconciliationPolicy;
use crate::repository::RepositoryPath;

/// The subset of `repositories` the policy wants materialized, order preserved.
///
/// Whitelist mode keeps only repositories named in `repositoryInclude`;
/// otherwise everything not named in `repositoryIgnore` is kept.
pub fn filter(repositories: &[RepositoryPath], policy: &ReconciliationPolicy) -> Vec<RepositoryPath> {
    let listed = |names: &[String], repo: &RepositoryPath| names.iter().any(|n| repo == n.as_str());

    repositories
        .iter()
        .filter(|repo| {
            if policy.is_whitelist() {
                listed(policy.repository_include(), *repo)
            } else {
                !listed(policy.repository_ignore(), *repo)
            }
        })
        .cloned()
        .collect()
}
