//! Normalized path handling and root sandboxing
//!
//! Every path the engine deletes or creates is computed here. Relative paths
//! are joined onto a root only through [`SandboxedRoot::resolve`], and parents
//! of relative paths are computed only through [`parent_of`], which strips the
//! final segment instead of appending `..`. Neither can produce a path above
//! the root, whatever the input.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

/// Final segment of a slash-separated path, including a trailing separator.
static LAST_SEGMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(/|^)[^/]*/?$").unwrap());

/// A path normalized to use forward slashes internally.
///
/// Provides consistent path handling across platforms by normalizing
/// all paths to forward slashes internally and converting to
/// platform-native format only at I/O boundaries. Dot segments are resolved
/// lexically; a relative path can never begin with `..`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str.replace('\\', "/")),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment, resolving any dot segments.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.is_empty() {
            segment_normalized
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) if trimmed.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

/// Lexically resolve `.`, `..` and empty segments.
///
/// `..` never climbs above `/` for absolute paths and is dropped outright when
/// it would escape the start of a relative path.
fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    if absolute {
        format!("/{}", body)
    } else {
        body
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

/// Strip the final segment (and any trailing separator) from a relative path.
///
/// The empty string stands for the root itself and is its own parent, so
/// callers walking upward stop there.
pub fn parent_of(relative: &str) -> &str {
    LAST_SEGMENT
        .find(relative)
        .map_or("", |last| &relative[..last.start()])
}

/// Successive parents of a relative path, nearest first, excluding the root.
pub fn ancestors(relative: &str) -> Ancestors<'_> {
    Ancestors { current: relative }
}

/// Iterator returned by [`ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    current: &'a str,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.current.is_empty() {
            return None;
        }
        self.current = parent_of(self.current);
        (!self.current.is_empty()).then_some(self.current)
    }
}

/// Reduce arbitrary input to a relative path with no `.`, `..` or empty segments.
///
/// Leading separators are discarded and `..` only ever cancels a segment that
/// was written before it, so the result always stays beneath whatever root it
/// is later joined onto.
pub fn sanitize_relative(input: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in input.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Normalize a user-entered setting path.
///
/// Converts separators to `/`, collapses repeats, and strips `.` segments and
/// leading or trailing separators. `..` is kept verbatim: stored values are
/// made safe at resolution time, not here.
pub fn normalize_setting_path(input: &str) -> String {
    input
        .trim()
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `path` equals `prefix` or lies beneath it, on segment boundaries.
pub fn is_under(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return false;
    }
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'/')
}

/// Whether `path` equals `suffix` or ends with `/suffix`.
pub fn ends_with_segments(path: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    path == suffix
        || (path.len() > suffix.len()
            && path.ends_with(suffix)
            && path.as_bytes()[path.len() - suffix.len() - 1] == b'/')
}

/// An absolute directory that relative paths are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxedRoot {
    root: PathBuf,
}

impl SandboxedRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Canonicalize `root` first, so later prefix checks compare real paths.
    pub fn canonical(root: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(dunce::canonicalize(root)?))
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Join `relative` onto the root after sanitizing it.
    ///
    /// An empty (or fully cancelled) relative path resolves to the root itself.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let clean = sanitize_relative(relative);
        if clean.is_empty() {
            self.root.clone()
        } else {
            self.root.join(clean)
        }
    }

    /// Express an absolute path beneath the root as a slash-separated relative path.
    pub fn relative_of(&self, path: &Path) -> Option<String> {
        let stripped = path.strip_prefix(&self.root).ok()?;
        Some(NormalizedPath::new(stripped).as_str().to_string())
    }

    /// Whether `path` lies beneath this root (or is the root).
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }
}
