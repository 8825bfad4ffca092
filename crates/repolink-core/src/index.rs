//! Repository discovery
//!
//! Walks the project root looking for directories that directly contain a
//! `.git` entry. A directory classified as a repository is never descended
//! into, so results are never nested.

use std::fs;
use std::path::{Path, PathBuf};

use repolink_fs::{WellKnownPath, tree};

use crate::repository::RepositoryPath;
use crate::{Error, Result};

/// Finds repositories beneath a project root.
#[derive(Debug, Clone)]
pub struct RepositoryIndexer {
    root: PathBuf,
    excluded: Vec<PathBuf>,
}

impl RepositoryIndexer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
        }
    }

    /// Never descend into `path` (typically a workspace nested in the project root).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every repository beneath the root, in depth-first, name-sorted order.
    ///
    /// Entries that vanish mid-scan are skipped. Regular files and directory
    /// symlinks are never descended into. Directories whose names cannot form a
    /// [`RepositoryPath`] are skipped with a warning, along with everything
    /// beneath them.
    pub fn index(&self) -> Result<Vec<RepositoryPath>> {
        if !self.root.is_dir() {
            return Err(Error::RootNotFound {
                path: self.root.clone(),
            });
        }

        let mut repositories = Vec::new();
        let mut stack: Vec<(PathBuf, String)> = Vec::new();
        self.push_children(&mut stack, &self.root, "")?;

        while let Some((dir, rel)) = stack.pop() {
            if is_repository(&dir)? {
                match RepositoryPath::new(&rel) {
                    Ok(repository) => {
                        tracing::trace!(%repository, "found repository");
                        repositories.push(repository);
                    }
                    Err(e) => {
                        tracing::warn!(path = %dir.display(), error = %e, "skipping repository");
                    }
                }
                continue;
            }
            self.push_children(&mut stack, &dir, &rel)?;
        }

        tracing::debug!(
            root = %self.root.display(),
            count = repositories.len(),
            "indexed repositories"
        );
        Ok(repositories)
    }

    fn push_children(
        &self,
        stack: &mut Vec<(PathBuf, String)>,
        dir: &Path,
        rel: &str,
    ) -> Result<()> {
        let Some(children) = tree::read_dir_sorted(dir)? else {
            return Ok(());
        };
        for child in children.into_iter().rev() {
            if !child.file_type.is_dir() || self.excluded.iter().any(|e| *e == child.path) {
                continue;
            }
            let Some(name) = segment_name(&child.path) else {
                tracing::warn!(
                    path = %child.path.display(),
                    "skipping directory whose name is not a valid path segment"
                );
                continue;
            };
            let child_rel = if rel.is_empty() {
                name.to_string()
            } else {
                format!("{}/{}", rel, name)
            };
            stack.push((child.path, child_rel));
        }
        Ok(())
    }
}

/// The native file name as one segment of a slash-separated path.
///
/// `None` for names that are not UTF-8, and outside Windows for names that
/// contain a backslash.
fn segment_name(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    if !cfg!(windows) && name.contains('\\') {
        return None;
    }
    Some(name)
}

fn is_repository(dir: &Path) -> Result<bool> {
    let marker = dir.join(WellKnownPath::GitMarker);
    match fs::symlink_metadata(&marker) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(marker, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn does_not_descend_into_repositories() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("outer/.git").create_dir_all().unwrap();
        temp.child("outer/vendor/inner/.git").create_dir_all().unwrap();

        let found = RepositoryIndexer::new(temp.path()).index().unwrap();
        assert_eq!(found, vec![RepositoryPath::new("outer").unwrap()]);
    }

    #[test]
    fn excluded_directory_is_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("alpha/.git").create_dir_all().unwrap();
        temp.child("vault/copied/.git").create_dir_all().unwrap();

        let found = RepositoryIndexer::new(temp.path())
            .exclude(temp.path().join("vault"))
            .index()
            .unwrap();
        assert_eq!(found, vec![RepositoryPath::new("alpha").unwrap()]);
    }

    #[cfg(unix)]
    #[test]
    fn backslash_names_are_skipped_without_failing() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("alpha/.git").create_dir_all().unwrap();
        temp.child("odd\\name/.git").create_dir_all().unwrap();
        temp.child("x\\../.git").create_dir_all().unwrap();
        temp.child("group\\sub/inner/.git").create_dir_all().unwrap();

        let found = RepositoryIndexer::new(temp.path()).index().unwrap();
        assert_eq!(found, vec![RepositoryPath::new("alpha").unwrap()]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("alpha/.git").create_dir_all().unwrap();
        let raw = temp.path().join(OsStr::from_bytes(b"caf\xe9"));
        if fs::create_dir_all(raw.join(".git")).is_err() {
            // Some filesystems refuse non-UTF-8 names outright.
            return;
        }

        let found = RepositoryIndexer::new(temp.path()).index().unwrap();
        assert_eq!(found, vec![RepositoryPath::new("alpha").unwrap()]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = RepositoryIndexer::new(temp.path().join("nope")).index().unwrap_err();
        assert!(matches!(err, Error::RootNotFound { .. }));
    }
}
