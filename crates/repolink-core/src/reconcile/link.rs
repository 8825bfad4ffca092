//! Link phase: materialize one repository in the workspace
//!
//! Configured directory links are linked wholesale. Every other document in
//! the repository gets its own file link, skipping ignored subtrees and
//! anything already reachable through a directory link.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use repolink_fs::{SandboxedRoot, ends_with_segments, is_under, sanitize_relative, symlink, tree};

use crate::policy::ReconciliationPolicy;
use crate::repository::RepositoryPath;
use crate::{Error, Result};

/// Links created or confirmed in place.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LinkCounts {
    pub dir_links: usize,
    pub file_links: usize,
}

pub(crate) struct Linker<'a> {
    project: &'a SandboxedRoot,
    workspace: &'a SandboxedRoot,
    dir_ignore: &'a [String],
    dir_links: Vec<String>,
    extensions: &'a [String],
}

impl<'a> Linker<'a> {
    pub(crate) fn new(
        project: &'a SandboxedRoot,
        workspace: &'a SandboxedRoot,
        policy: &'a ReconciliationPolicy,
        extensions: &'a [String],
    ) -> Self {
        let mut dir_links: Vec<String> = Vec::new();
        for link in policy.dir_link() {
            let clean = sanitize_relative(link);
            if !clean.is_empty() && !dir_links.contains(&clean) {
                dir_links.push(clean);
            }
        }
        Self {
            project,
            workspace,
            dir_ignore: policy.dir_ignore(),
            dir_links,
            extensions,
        }
    }

    /// Link `repo` into the workspace.
    ///
    /// Fails without writing anything if a symlink already sits anywhere on the
    /// repository's workspace path.
    pub(crate) fn link(&self, repo: &RepositoryPath) -> Result<LinkCounts> {
        if let Some(link) = tree::first_symlink(self.workspace.path(), repo.as_str())? {
            return Err(repolink_fs::Error::SymlinkInPath {
                path: self.workspace.resolve(&link),
            }
            .into());
        }

        let source = SandboxedRoot::new(self.project.resolve(repo.as_str()));
        let dest = SandboxedRoot::new(self.workspace.resolve(repo.as_str()));
        let mut counts = LinkCounts::default();

        create_dir_all(dest.path())?;

        for link in &self.dir_links {
            if link_directory(&source.resolve(link), &dest.resolve(link))? {
                counts.dir_links += 1;
            }
        }

        for document in self.documents(source.path())? {
            if link_file(&source.resolve(&document), &dest.resolve(&document))? {
                counts.file_links += 1;
            }
        }

        tracing::debug!(
            repository = %repo,
            dir_links = counts.dir_links,
            file_links = counts.file_links,
            "linked repository"
        );
        Ok(counts)
    }

    fn is_ignored(&self, rel: &str) -> bool {
        self.dir_ignore.iter().any(|entry| ends_with_segments(rel, entry))
    }

    fn under_dir_link(&self, rel: &str) -> bool {
        self.dir_links.iter().any(|link| is_under(rel, link))
    }

    fn is_document(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Repository-relative paths of every document to link individually.
    ///
    /// Directory symlinks are never descended into; file symlinks count as
    /// documents when their target is a regular file.
    fn documents(&self, repo_root: &Path) -> Result<Vec<String>> {
        let mut found = Vec::new();
        let mut stack: Vec<(PathBuf, String)> = vec![(repo_root.to_path_buf(), String::new())];

        while let Some((dir, rel)) = stack.pop() {
            let Some(children) = tree::read_dir_sorted(&dir)? else {
                continue;
            };

            let mut subdirs = Vec::new();
            for child in children {
                let child_rel = if rel.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", rel, child.name)
                };

                if child.file_type.is_dir() {
                    if self.is_ignored(&child_rel) || self.under_dir_link(&child_rel) {
                        tracing::trace!(path = %child_rel, "not descending");
                        continue;
                    }
                    subdirs.push((child.path, child_rel));
                    continue;
                }

                let is_file = child.file_type.is_file()
                    || (child.file_type.is_symlink()
                        && fs::metadata(&child.path).is_ok_and(|meta| meta.is_file()));
                if is_file && self.is_document(&child.name) && !self.under_dir_link(&child_rel) {
                    found.push(child_rel);
                }
            }
            stack.extend(subdirs.into_iter().rev());
        }

        Ok(found)
    }
}

fn create_dir_all(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

fn create_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) => create_dir_all(parent),
        None => Ok(()),
    }
}

/// Source metadata, following links. `None` when the source is gone.
fn source_metadata(source: &Path) -> Result<Option<fs::Metadata>> {
    match fs::metadata(source) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(source, e)),
    }
}

/// Destination metadata, not following links. `None` when nothing is there.
fn dest_metadata(dest: &Path) -> Result<Option<fs::Metadata>> {
    match fs::symlink_metadata(dest) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(dest, e)),
    }
}

fn tolerate_missing(path: &Path, result: std::io::Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Link a whole directory. Returns whether a correct link is now in place.
fn link_directory(source: &Path, dest: &Path) -> Result<bool> {
    match source_metadata(source)? {
        Some(meta) if meta.is_dir() => {}
        _ => {
            tracing::trace!(source = %source.display(), "no directory to link");
            return Ok(false);
        }
    }

    create_parent(dest)?;
    match dest_metadata(dest)? {
        Some(meta) if meta.file_type().is_symlink() => {
            if symlink::points_to(dest, source) {
                return Ok(true);
            }
            tolerate_missing(dest, symlink::remove_link(dest))?;
        }
        Some(meta) if meta.is_dir() => {
            tree::remove_tree(dest, "", &mut |_| {})?;
        }
        Some(_) => {
            tracing::warn!(dest = %dest.display(), "file in the way of directory link, leaving it");
            return Ok(false);
        }
        None => {}
    }

    match symlink::symlink_dir(source, dest) {
        Ok(()) => {
            tracing::debug!(dest = %dest.display(), "created directory link");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(dest, e)),
    }
}

/// Link a single document. Returns whether a correct link is now in place.
fn link_file(source: &Path, dest: &Path) -> Result<bool> {
    if source_metadata(source)?.is_none() {
        tracing::debug!(source = %source.display(), "source vanished, skipping");
        return Ok(false);
    }

    create_parent(dest)?;
    match dest_metadata(dest)? {
        Some(meta) if meta.file_type().is_symlink() => {
            if symlink::points_to(dest, source) {
                return Ok(true);
            }
            tolerate_missing(dest, symlink::remove_link(dest))?;
        }
        Some(meta) if meta.is_dir() => {
            tracing::warn!(dest = %dest.display(), "directory in the way of file link, leaving it");
            return Ok(false);
        }
        Some(_) => tolerate_missing(dest, fs::remove_file(dest))?,
        None => {}
    }

    match symlink::symlink_file(source, dest) {
        Ok(()) => {
            tracing::trace!(dest = %dest.display(), "created file link");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(dest, e)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::policy::ListSetting;

    struct Roots {
        _dir: tempfile::TempDir,
        project: SandboxedRoot,
        workspace: SandboxedRoot,
    }

    fn roots() -> Roots {
        let dir = tempfile::tempdir().unwrap();
        let base = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(base.join("project")).unwrap();
        fs::create_dir_all(base.join("workspace")).unwrap();
        Roots {
            project: SandboxedRoot::new(base.join("project")),
            workspace: SandboxedRoot::new(base.join("workspace")),
            _dir: dir,
        }
    }

    fn write(root: &SandboxedRoot, rel: &str) {
        let path = root.resolve(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "# doc").unwrap();
    }

    fn extensions() -> Vec<String> {
        vec!["md".to_string()]
    }

    #[test]
    fn links_dir_link_and_loose_documents() {
        let r = roots();
        write(&r.project, "alpha/docs/guide.md");
        write(&r.project, "alpha/README.md");
        write(&r.project, "alpha/src/notes.md");
        write(&r.project, "alpha/src/main.rs");

        let policy = ReconciliationPolicy::default();
        let ext = extensions();
        let linker = Linker::new(&r.project, &r.workspace, &policy, &ext);
        let counts = linker.link(&RepositoryPath::new("alpha").unwrap()).unwrap();

        assert_eq!(counts, LinkCounts { dir_links: 1, file_links: 2 });
        let docs = r.workspace.resolve("alpha/docs");
        assert!(fs::symlink_metadata(&docs).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_link(&docs).unwrap(), r.project.resolve("alpha/docs"));
        assert!(symlink::points_to(
            &r.workspace.resolve("alpha/src/notes.md"),
            &r.project.resolve("alpha/src/notes.md")
        ));
        assert!(!r.workspace.resolve("alpha/src/main.rs").exists());
    }

    #[test]
    fn ignored_subtrees_are_not_enumerated() {
        let r = roots();
        write(&r.project, "alpha/node_modules/pkg/readme.md");
        write(&r.project, "alpha/lib/vendor/node_modules/x.md");
        write(&r.project, "alpha/lib/keep.md");

        let policy = ReconciliationPolicy::default();
        let ext = extensions();
        let linker = Linker::new(&r.project, &r.workspace, &policy, &ext);
        let docs = linker.documents(&r.project.resolve("alpha")).unwrap();

        assert_eq!(docs, vec!["lib/keep.md"]);
    }

    #[test]
    fn relinking_is_a_noop() {
        let r = roots();
        write(&r.project, "alpha/docs/guide.md");
        write(&r.project, "alpha/notes.md");

        let policy = ReconciliationPolicy::default();
        let ext = extensions();
        let linker = Linker::new(&r.project, &r.workspace, &policy, &ext);
        let repo = RepositoryPath::new("alpha").unwrap();
        let first = linker.link(&repo).unwrap();
        let second = linker.link(&repo).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            tree::walk_relative(r.workspace.path()).unwrap(),
            vec!["alpha", "alpha/docs", "alpha/notes.md"]
        );
    }

    #[test]
    fn stale_directory_at_dir_link_is_replaced() {
        let r = roots();
        write(&r.project, "alpha/docs/guide.md");
        write(&r.workspace, "alpha/docs/stale.md");

        let policy = ReconciliationPolicy::default();
        let ext = extensions();
        Linker::new(&r.project, &r.workspace, &policy, &ext)
            .link(&RepositoryPath::new("alpha").unwrap())
            .unwrap();

        assert!(r.workspace.resolve("alpha/docs/guide.md").exists());
        assert!(!r.project.resolve("alpha/docs/stale.md").exists());
    }

    #[test]
    fn missing_dir_link_source_is_skipped() {
        let r = roots();
        write(&r.project, "beta/notes.md");

        let policy = ReconciliationPolicy::default()
            .with_list(ListSetting::DirLink, ["docs", "wiki"])
            .unwrap();
        let ext = extensions();
        let counts = Linker::new(&r.project, &r.workspace, &policy, &ext)
            .link(&RepositoryPath::new("beta").unwrap())
            .unwrap();

        assert_eq!(counts, LinkCounts { dir_links: 0, file_links: 1 });
    }

    #[test]
    fn escaping_dir_link_stays_inside_repository() {
        let r = roots();
        write(&r.project, "alpha/docs/guide.md");
        write(&r.project, "secret/docs/key.md");

        let policy = ReconciliationPolicy::default()
            .with_list(ListSetting::DirLink, ["../secret/docs"])
            .unwrap();
        let ext = extensions();
        Linker::new(&r.project, &r.workspace, &policy, &ext)
            .link(&RepositoryPath::new("alpha").unwrap())
            .unwrap();

        assert!(!r.workspace.resolve("secret").exists());
        assert!(fs::symlink_metadata(r.workspace.resolve("alpha/secret/docs")).is_err());
    }

    #[test]
    fn refuses_to_write_through_workspace_symlink() {
        let r = roots();
        write(&r.project, "group/packages/inner/README.md");
        fs::create_dir_all(r.workspace.resolve("group")).unwrap();
        symlink::symlink_dir(
            &r.project.resolve("group/packages"),
            &r.workspace.resolve("group/packages"),
        )
        .unwrap();

        let policy = ReconciliationPolicy::default();
        let ext = extensions();
        let err = Linker::new(&r.project, &r.workspace, &policy, &ext)
            .link(&RepositoryPath::new("group/packages/inner").unwrap())
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Fs(repolink_fs::Error::SymlinkInPath { ref path }) if path.ends_with("group/packages")
        ));
        let readme = r.project.resolve("group/packages/inner/README.md");
        assert!(!fs::symlink_metadata(&readme).unwrap().file_type().is_symlink());
    }
}
