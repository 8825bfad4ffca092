//! Error types for repolink-core

use std::path::PathBuf;

/// Result type for repolink-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repolink-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A repository path was empty, absolute or contained `..`
    #[error("Invalid repository path '{path}': {reason}")]
    InvalidRepositoryPath { path: String, reason: String },

    /// A configured root does not exist or is not a directory
    #[error("Root directory not found: {path}")]
    RootNotFound { path: PathBuf },

    /// Teardown of the workspace could reach into the project root
    #[error("Project root {project} must not be inside workspace root {workspace}")]
    OverlappingRoots { project: PathBuf, workspace: PathBuf },

    /// A list setting value normalized to nothing
    #[error("Setting value '{value}' is empty after normalization")]
    EmptySettingValue { value: String },

    /// Another reconciliation pass has not finished yet
    #[error("A reconciliation pass is already in progress")]
    ReconcileInProgress,

    /// Policy could not be loaded or saved
    #[error("Policy store error: {message}")]
    PolicyStore { message: String },

    /// Filesystem error from repolink-fs
    #[error(transparent)]
    Fs(#[from] repolink_fs::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(repolink_fs::Error::io(path, source))
    }
}
