//! Teardown phase: clear every indexed repository out of the workspace

use repolink_fs::{SandboxedRoot, ancestors, tree};

use crate::Result;
use crate::repository::RepositoryPath;
use crate::trace::SharedTrace;

/// Remove each repository's workspace subtree, then any ancestors left empty.
///
/// A symlink on the way to a repository (left behind by an earlier pass that
/// linked a parent directory) is unlinked in place of the subtree and never
/// traversed.
///
/// Every removed path is recorded in `trace` as it goes. The trace is marked
/// complete only when all repositories have been processed, so a failure
/// part-way leaves it incomplete. Returns the number of removed paths.
pub(crate) fn teardown(
    workspace: &SandboxedRoot,
    repositories: &[RepositoryPath],
    trace: &SharedTrace,
) -> Result<usize> {
    let mut deleted = 0;

    for repo in repositories {
        let start = match tree::first_symlink(workspace.path(), repo.as_str())? {
            Some(link) if link != repo.as_str() => {
                tracing::debug!(
                    repository = %repo,
                    link = %link,
                    "unlinking stale link above repository"
                );
                link
            }
            _ => repo.as_str().to_string(),
        };
        let removed = tree::remove_tree(&workspace.resolve(&start), &start, &mut |path| {
            tracing::debug!(path, "deleted");
            trace.lock().record_deleted(path);
        })?;
        deleted += removed;

        for ancestor in ancestors(repo.as_str()) {
            if tree::remove_dir_if_empty(&workspace.resolve(ancestor))? {
                tracing::debug!(path = ancestor, "deleted empty ancestor");
                trace.lock().record_deleted(ancestor);
                deleted += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(repository = %repo, removed, "tore down repository");
        }
    }

    trace.lock().mark_removal_complete();
    Ok(deleted)
}
