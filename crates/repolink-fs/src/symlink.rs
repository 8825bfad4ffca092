//! Platform symlink primitives

use std::fs;
use std::io;
use std::path::Path;

/// Create a symlink at `link` pointing to the directory `target`.
pub fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_dir(target, link)
    }
}

/// Create a symlink at `link` pointing to the file `target`.
pub fn symlink_file(target: &Path, link: &Path) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link)
    }
    #[cfg(windows)]
    {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Remove the link itself, never what it points at.
pub fn remove_link(link: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        // Directory links are directories as far as Windows removal is concerned
        if fs::metadata(link).map(|m| m.is_dir()).unwrap_or(false) {
            return fs::remove_dir(link);
        }
    }
    fs::remove_file(link)
}

/// Whether `link` is a symlink whose stored target is exactly `target`.
pub fn points_to(link: &Path, target: &Path) -> bool {
    fs::read_link(link).is_ok_and(|stored| stored == target)
}
