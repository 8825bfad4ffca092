//! Repository identity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Slash-separated path of a repository, relative to the project root.
///
/// Never empty, never absolute, never contains `.` or `..` segments. A
/// backslash is read as a separator on Windows and refused elsewhere, where it
/// is an ordinary file name character that workspace resolution would split on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryPath(String);

impl RepositoryPath {
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();
        let invalid = |reason: &str| Error::InvalidRepositoryPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let unified = if cfg!(windows) {
            raw.replace('\\', "/")
        } else if raw.contains('\\') {
            return Err(invalid("must not contain a backslash"));
        } else {
            raw.to_string()
        };
        if unified.starts_with('/') {
            return Err(invalid("must be relative"));
        }
        let segments: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if segments.iter().any(|s| *s == ".." || *s == ".") {
            return Err(invalid("must not contain dot segments"));
        }

        Ok(Self(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    /// Join a repository-relative subpath onto this repository.
    pub fn join(&self, subpath: &str) -> String {
        if subpath.is_empty() {
            self.0.clone()
        } else {
            format!("{}/{}", self.0, subpath)
        }
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RepositoryPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RepositoryPath> for String {
    fn from(value: RepositoryPath) -> Self {
        value.0
    }
}

impl PartialEq<str> for RepositoryPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
