//! Command implementations for repolink-cli

pub mod completions;
pub mod index;
pub mod policy;
pub mod reconcile;
pub mod status;

pub use completions::run_completions;
pub use index::run_index;
pub use policy::run_policy;
pub use reconcile::{run_reconcile, run_start};
pub use status::run_status;

use serde::Serialize;

use crate::error::Result;

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
