//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Tuning for [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying the advisory lock before giving up
    pub lock_timeout: Duration,
    /// Whether to fsync the temp file before renaming it into place
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes. An
/// exclusive advisory lock on a `<file>.lock` sidecar serializes writers; the
/// lock is retried with exponential backoff until `config.lock_timeout`.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock_path = sidecar(&native_path, ".lock");
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;
    acquire_lock(&lock_file, config.lock_timeout).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let result = write_temp(&temp_path, content, config.enable_fsync)
        .and_then(|()| fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    FileExt::unlock(&lock_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    result
}

fn write_temp(temp_path: &Path, content: &[u8], fsync: bool) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    if fsync {
        temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;
    }
    Ok(())
}

fn acquire_lock(file: &File, timeout: Duration) -> std::io::Result<()> {
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(5),
        max_interval: Duration::from_millis(250),
        max_elapsed_time: Some(timeout),
        ..ExponentialBackoff::default()
    };
    backoff::retry(policy, || {
        file.try_lock_exclusive()
            .map_err(backoff::Error::transient)
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Fail if any existing directory between `boundary` and `path` is a symlink.
///
/// Components at or above `boundary` are trusted. Paths outside `boundary`
/// are not checked.
pub fn ensure_no_symlink_below(boundary: &Path, path: &Path) -> Result<()> {
    let Ok(below) = path.strip_prefix(boundary) else {
        return Ok(());
    };

    let mut current = boundary.to_path_buf();
    let components: Vec<_> = below.components().collect();
    // The final component is the file itself; replacing a link there is fine
    for component in components.iter().take(components.len().saturating_sub(1)) {
        current.push(component);
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                return Err(Error::SymlinkInPath { path: current });
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) => return Err(Error::io(&current, e)),
        }
    }
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically with default robustness settings.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes(), RobustnessConfig::default())
}
