//! Repository discovery and symlink reconciliation for repolink
//!
//! This crate keeps a host-managed workspace tree convergent with a project
//! root full of version-controlled repositories:
//!
//! - **Indexing**: find every directory directly containing a `.git` entry
//! - **Filtering**: whitelist or blacklist repositories by policy
//! - **Reconciliation**: tear the workspace down, wait for the host's cache to
//!   confirm every deletion, then relink directories and documents
//! - **Presentation**: classify workspace entries for tree decorations
//!
//! # Architecture
//!
//! ```text
//!              LinkEngine
//!                  |
//!             Reconciler ---- Host (deletion events, refresh hooks)
//!                  |
//!   +--------+-----+-----+---------+----------+
//!   |        |           |         |          |
//! index   filter     teardown    gate       link
//!                        |         |
//!                  DeletionTrace  schedule
//!                        |
//!                   repolink-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use repolink_core::{filter, ReconciliationPolicy, RepositoryIndexer};
//!
//! let indexed = RepositoryIndexer::new("/home/me/projects").index()?;
//! let selected = filter(&indexed, &ReconciliationPolicy::default());
//! ```

pub mod engine;
pub mod error;
pub mod filter;
pub mod host;
pub mod index;
pub mod policy;
pub mod presentation;
pub mod reconcile;
pub mod repository;
pub mod schedule;
pub mod trace;

pub use engine::LinkEngine;
pub use error::{Error, Result};
pub use filter::filter;
pub use host::{DeletionHandler, Host, NullHost, PollingHost, SubscriptionId};
pub use index::RepositoryIndexer;
pub use policy::{
    FilePolicyStore, ListSetting, PolicyStore, PolicyUpdate, ReconciliationPolicy, ToggleSetting,
};
pub use presentation::{EntryState, IconContext, IconKind, compute_icon};
pub use reconcile::{
    EngineOptions, GateConfig, GateOutcome, ReconcileReport, Reconciler, Refresh,
};
pub use repository::RepositoryPath;
pub use schedule::{Delay, Limits, RetrySchedule, ScheduleOutcome, schedule};
pub use trace::{DeletionTrace, SharedTrace, paths_equal};
