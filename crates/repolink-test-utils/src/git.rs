//! Version-control marker fixtures at two realism levels.
//!
//! The indexer only looks for a `.git` entry, so the fake fixtures are enough
//! for nearly every test.

use std::fs;
use std::path::Path;

/// Creates a minimal `.git` directory without initialising a real repository.
///
/// Realism level: **FAKE**: directory structure only, no object store.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git/refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}

/// Creates a `.git` *file* the way worktrees and submodules do.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_file(path: &Path) {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("fake_git_file: failed to create {}: {e}", path.display()));
    fs::write(path.join(".git"), "gitdir: ../.git/worktrees/checkout\n")
        .unwrap_or_else(|e| panic!("fake_git_file: failed to write .git: {e}"));
}

/// Initialises a real git repository using `git2` (no initial commit).
///
/// Realism level: **REAL**: valid git object store, empty history.
///
/// # Panics
/// Panics if `git2::Repository::init` fails.
pub fn real_git_repo(path: &Path) -> git2::Repository {
    git2::Repository::init(path).unwrap_or_else(|e| {
        panic!(
            "real_git_repo: failed to init repository at {}: {e}",
            path.display()
        )
    })
}
