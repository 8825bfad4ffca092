//! [`TestTree`]: a project root and a workspace root in one temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use repolink_fs::{SandboxedRoot, tree};
use tempfile::TempDir;

use crate::git;

/// Two canonicalized roots with helpers for building repositories and
/// asserting on the workspace layout.
///
/// # Example
///
/// ```rust,no_run
/// use repolink_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.repo("alpha").write("alpha/docs/guide.md", "# Guide");
/// assert!(tree.workspace_listing().is_empty());
/// ```
pub struct TestTree {
    _temp_dir: TempDir,
    project: SandboxedRoot,
    workspace: SandboxedRoot,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Sibling roots: `<tmp>/project` and `<tmp>/workspace`.
    pub fn new() -> Self {
        Self::with_layout("project", "workspace")
    }

    /// Workspace nested inside the project root, at `<tmp>/project/vault`.
    pub fn nested() -> Self {
        Self::with_layout("project", "project/vault")
    }

    fn with_layout(project: &str, workspace: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        // Canonicalize so link targets compare equal on platforms where the
        // temp dir sits behind a symlink
        let base = fs::canonicalize(temp_dir.path()).unwrap();
        fs::create_dir_all(base.join(project)).unwrap();
        fs::create_dir_all(base.join(workspace)).unwrap();
        Self {
            project: SandboxedRoot::new(base.join(project)),
            workspace: SandboxedRoot::new(base.join(workspace)),
            _temp_dir: temp_dir,
        }
    }

    pub fn project(&self) -> &SandboxedRoot {
        &self.project
    }

    pub fn workspace(&self) -> &SandboxedRoot {
        &self.workspace
    }

    /// Create `rel` in the project root as a repository with a fake `.git`.
    pub fn repo(&self, rel: &str) -> &Self {
        let path = self.project.resolve(rel);
        fs::create_dir_all(&path).unwrap();
        git::fake_git_dir(&path);
        self
    }

    /// Write a file under the project root, creating parents.
    pub fn write(&self, rel: &str, content: &str) -> &Self {
        write_file(&self.project.resolve(rel), content);
        self
    }

    /// Write a file under the workspace root, creating parents.
    pub fn write_workspace(&self, rel: &str, content: &str) -> &Self {
        write_file(&self.workspace.resolve(rel), content);
        self
    }

    pub fn project_path(&self, rel: &str) -> PathBuf {
        self.project.resolve(rel)
    }

    pub fn workspace_path(&self, rel: &str) -> PathBuf {
        self.workspace.resolve(rel)
    }

    /// Every workspace path, relative and depth-first. Links are not followed.
    pub fn workspace_listing(&self) -> Vec<String> {
        tree::walk_relative(self.workspace.path()).unwrap()
    }

    /// Where the workspace link at `rel` points, if it is a link.
    pub fn link_target(&self, rel: &str) -> Option<PathBuf> {
        fs::read_link(self.workspace_path(rel)).ok()
    }

    /// Assert `rel` is a directory link to the same path in the project.
    pub fn assert_dir_link(&self, rel: &str) {
        self.assert_link(rel);
        assert!(
            self.workspace_path(rel).is_dir(),
            "Expected {rel} to resolve to a directory"
        );
    }

    /// Assert `rel` is a file link to the same path in the project.
    pub fn assert_file_link(&self, rel: &str) {
        self.assert_link(rel);
        assert!(
            self.workspace_path(rel).is_file(),
            "Expected {rel} to resolve to a file"
        );
    }

    /// Assert nothing at all exists at `rel` in the workspace.
    pub fn assert_absent(&self, rel: &str) {
        assert!(
            fs::symlink_metadata(self.workspace_path(rel)).is_err(),
            "Expected {rel} to be absent from the workspace"
        );
    }

    fn assert_link(&self, rel: &str) {
        assert_eq!(
            self.link_target(rel).as_deref(),
            Some(self.project_path(rel).as_path()),
            "Expected {rel} to link into the project root"
        );
    }
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}
