//! Filesystem primitives for repolink
//!
//! Provides root-sandboxed path resolution, the parent-walk used by every
//! deletion routine, symlink-aware tree removal and atomic config storage.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod symlink;
pub mod tree;

pub use config::{ConfigStore, Format};
pub use constants::WellKnownPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{
    Ancestors, NormalizedPath, SandboxedRoot, ancestors, ends_with_segments, is_under,
    normalize_setting_path, parent_of, sanitize_relative,
};
