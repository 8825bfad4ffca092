//! [`ManualHost`]: a host whose deletion events are emitted by the test.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use repolink_core::{DeletionHandler, Host, RepositoryPath, SubscriptionId};

/// Records every call the engine makes and delivers only the deletion events
/// the test emits. A pass run against it without emitting anything times out
/// at the gate.
#[derive(Default)]
pub struct ManualHost {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<SubscriptionId, DeletionHandler>>,
    subscriptions: AtomicUsize,
    repository_sets: Mutex<Vec<Vec<RepositoryPath>>>,
    refreshes: AtomicUsize,
}

impl ManualHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `path` to every current subscriber.
    pub fn emit(&self, path: &str) {
        let handlers: Vec<DeletionHandler> = self.handlers.lock().unwrap().values().cloned().collect();
        for handler in handlers {
            handler(path);
        }
    }

    /// Subscribers attached right now.
    pub fn active_subscriptions(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    /// Subscriptions ever made.
    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Every repository set the engine announced, oldest first.
    pub fn repository_sets(&self) -> Vec<Vec<RepositoryPath>> {
        self.repository_sets.lock().unwrap().clone()
    }

    pub fn presentation_refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl Host for ManualHost {
    fn on_deletion(&self, handler: DeletionHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.handlers.lock().unwrap().insert(id, handler);
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        id
    }

    fn off_deletion(&self, id: SubscriptionId) {
        self.handlers.lock().unwrap().remove(&id);
    }

    fn repository_set_changed(&self, repositories: &[RepositoryPath]) {
        self.repository_sets.lock().unwrap().push(repositories.to_vec());
    }

    fn presentation_refresh_needed(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}
