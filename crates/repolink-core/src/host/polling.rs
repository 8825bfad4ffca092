//! A host backed by periodic rescans of the workspace tree
//!
//! Stands in for an editor's file cache when the engine runs headless. Each
//! subscription snapshots the tree, then a background task rescans it on an
//! interval and reports every path that has disappeared since the last scan.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use repolink_fs::tree;

use super::{DeletionHandler, Host, SubscriptionId};

/// Default rescan interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// [`Host`] that discovers deletions by diffing successive tree scans.
///
/// Subscribing spawns onto the current tokio runtime, so [`Host::on_deletion`]
/// must be called from within one.
#[derive(Debug)]
pub struct PollingHost {
    root: PathBuf,
    interval: Duration,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<SubscriptionId, JoinHandle<()>>>,
}

impl PollingHost {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_interval(root, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(root: impl Into<PathBuf>, interval: Duration) -> Self {
        Self {
            root: root.into(),
            interval,
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of live subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn scan(root: &Path) -> Option<HashSet<String>> {
    match tree::walk_relative(root) {
        Ok(paths) => Some(paths.into_iter().collect()),
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "workspace scan failed");
            None
        }
    }
}

async fn watch(root: PathBuf, interval: Duration, mut known: HashSet<String>, handler: DeletionHandler) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let Some(current) = scan(&root) else {
            continue;
        };
        let mut gone: Vec<&String> = known.difference(&current).collect();
        gone.sort();
        for path in gone {
            tracing::trace!(path = %path, "host dropped path");
            handler(path);
        }
        known = current;
    }
}

impl Host for PollingHost {
    fn on_deletion(&self, handler: DeletionHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let known = scan(&self.root).unwrap_or_default();
        let task = tokio::spawn(watch(self.root.clone(), self.interval, known, handler));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        id
    }

    fn off_deletion(&self, id: SubscriptionId) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl Drop for PollingHost {
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, task) in tasks.drain() {
            task.abort();
        }
    }
}
