//! Symlink-aware directory walking and removal
//!
//! Walks use an explicit stack and never descend through directory symlinks,
//! so neither removal nor listing can leave the tree they started in.

use std::fs::{self, FileType};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, Result, sanitize_relative, symlink};

/// One child of a directory, as seen without following symlinks.
#[derive(Debug, Clone)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub file_type: FileType,
}

/// List a directory sorted by name.
///
/// Returns `Ok(None)` when the directory has vanished.
pub fn read_dir_sorted(dir: &Path) -> Result<Option<Vec<Entry>>> {
    let reader = match fs::read_dir(dir) {
        Ok(reader) => reader,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut entries = Vec::new();
    for item in reader {
        let item = item.map_err(|e| Error::io(dir, e))?;
        let file_type = match item.file_type() {
            Ok(file_type) => file_type,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::io(item.path(), e)),
        };
        entries.push(Entry {
            name: item.file_name().to_string_lossy().into_owned(),
            path: item.path(),
            file_type,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Some(entries))
}

/// Remove `target` and everything beneath it without following symlinks.
///
/// `relative` names `target` in whatever coordinate system the caller tracks;
/// `on_removed` receives that name (extended with child segments) for every
/// file, link and directory actually removed, children before parents.
/// Entries that vanish concurrently are skipped. Returns the removal count.
pub fn remove_tree(
    target: &Path,
    relative: &str,
    on_removed: &mut dyn FnMut(&str),
) -> Result<usize> {
    let mut removed = 0;
    let mut stack = vec![(target.to_path_buf(), relative.to_string(), false)];

    while let Some((path, rel, expanded)) = stack.pop() {
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(Error::io(&path, e)),
        };

        let outcome = if meta.is_dir() && !expanded {
            let children = read_dir_sorted(&path)?.unwrap_or_default();
            stack.push((path, rel.clone(), true));
            for child in children {
                let child_rel = if rel.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", rel, child.name)
                };
                stack.push((child.path, child_rel, false));
            }
            continue;
        } else if meta.is_dir() {
            fs::remove_dir(&path)
        } else if meta.file_type().is_symlink() {
            symlink::remove_link(&path)
        } else {
            fs::remove_file(&path)
        };

        match outcome {
            Ok(()) => {
                tracing::trace!(path = %rel, "removed");
                on_removed(&rel);
                removed += 1;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&path, e)),
        }
    }

    Ok(removed)
}

/// Remove `dir` only if it is a real, empty directory.
///
/// Returns whether it was removed. Missing paths, symlinks and non-empty
/// directories are left alone.
pub fn remove_dir_if_empty(dir: &Path) -> Result<bool> {
    match fs::symlink_metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(dir, e)),
    }

    match read_dir_sorted(dir)? {
        Some(children) if children.is_empty() => {}
        _ => return Ok(false),
    }

    match fs::remove_dir(dir) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(dir, e)),
    }
}

/// The shallowest symlink among the segments of `relative` beneath `root`.
///
/// Every segment is checked, the last one included, and none is followed.
/// The walk stops at the first segment that does not exist or whose parent is
/// not a directory. Returns the link's relative path.
pub fn first_symlink(root: &Path, relative: &str) -> Result<Option<String>> {
    let clean = sanitize_relative(relative);
    let mut current = root.to_path_buf();
    let mut end = 0;

    for segment in clean.split('/').filter(|s| !s.is_empty()) {
        current.push(segment);
        end += if end == 0 { segment.len() } else { segment.len() + 1 };
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Ok(Some(clean[..end].to_string()));
            }
            Ok(_) => {}
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(e) => return Err(Error::io(&current, e)),
        }
    }
    Ok(None)
}

/// Every path beneath `root`, relative and slash-separated, in depth-first order.
///
/// Symlinks are listed but not descended into.
pub fn walk_relative(root: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    let mut stack: Vec<(Entry, String)> = Vec::new();
    push_children(&mut stack, root, "")?;

    while let Some((entry, rel)) = stack.pop() {
        if entry.file_type.is_dir() {
            push_children(&mut stack, &entry.path, &rel)?;
        }
        found.push(rel);
    }

    Ok(found)
}

fn push_children(stack: &mut Vec<(Entry, String)>, dir: &Path, rel: &str) -> Result<()> {
    let Some(children) = read_dir_sorted(dir)? else {
        return Ok(());
    };
    for child in children.into_iter().rev() {
        let child_rel = if rel.is_empty() {
            child.name.clone()
        } else {
            format!("{}/{}", rel, child.name)
        };
        stack.push((child, child_rel));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn remove_tree_reports_children_before_parents() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("alpha");
        fs::create_dir_all(target.join("docs")).unwrap();
        fs::write(target.join("docs/guide.md"), "# guide").unwrap();

        let mut seen = Vec::new();
        let count = remove_tree(&target, "alpha", &mut |p| seen.push(p.to_string())).unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, vec!["alpha/docs/guide.md", "alpha/docs", "alpha"]);
        assert!(!target.exists());
    }

    #[test]
    fn remove_tree_on_missing_target_is_noop() {
        let dir = tempdir().unwrap();
        let count = remove_tree(&dir.path().join("gone"), "gone", &mut |_| {}).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn remove_dir_if_empty_keeps_populated_dirs() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("full")).unwrap();
        fs::write(dir.path().join("full/f"), "").unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        assert!(!remove_dir_if_empty(&dir.path().join("full")).unwrap());
        assert!(remove_dir_if_empty(&dir.path().join("empty")).unwrap());
        assert!(!remove_dir_if_empty(&dir.path().join("missing")).unwrap());
    }
}
