//! Well-known names in project and workspace trees.

use std::path::Path;

/// Fixed path names the engine looks for or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownPath {
    /// The `.git` entry marking a repository root
    GitMarker,
    /// The `.repolink` directory holding local state inside a workspace
    StateDir,
    /// The persisted policy file inside the state directory
    PolicyFile,
}

impl WellKnownPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitMarker => ".git",
            Self::StateDir => ".repolink",
            Self::PolicyFile => "policy.json",
        }
    }
}

impl AsRef<Path> for WellKnownPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for WellKnownPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for WellKnownPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
