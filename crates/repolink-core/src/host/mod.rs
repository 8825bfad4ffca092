//! Host collaborator abstraction
//!
//! The host owns a cached view of the workspace tree that lags behind the
//! real filesystem. The engine subscribes to the host's deletion events while
//! it tears the workspace down, and pokes the host after state changes so its
//! presentation layers can resynchronize.

mod polling;

pub use polling::PollingHost;

use std::sync::Arc;

use crate::repository::RepositoryPath;

/// Receives one workspace-relative path per call when the host drops it.
pub type DeletionHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`Host::on_deletion`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Trait for the editor or process hosting the workspace.
///
/// Notification hooks are fire-and-forget: the engine never waits on them and
/// their default implementations do nothing.
pub trait Host: Send + Sync {
    /// Start delivering deletion events to `handler`.
    fn on_deletion(&self, handler: DeletionHandler) -> SubscriptionId;

    /// Stop delivering events for `id`. Unknown ids are ignored.
    fn off_deletion(&self, id: SubscriptionId);

    /// Called after every refresh with the filtered repository set.
    fn repository_set_changed(&self, _repositories: &[RepositoryPath]) {}

    /// Called after policy mutations and completed passes.
    fn presentation_refresh_needed(&self) {}
}

/// A host that never reports anything.
///
/// Passes run against it always time out at the gate, which only delays
/// linking by the configured maximum wait.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {
    fn on_deletion(&self, _handler: DeletionHandler) -> SubscriptionId {
        SubscriptionId(0)
    }

    fn off_deletion(&self, _id: SubscriptionId) {}
}

/// Keeps a deletion subscription alive for its own lifetime.
pub(crate) struct Subscription<'a> {
    host: &'a dyn Host,
    id: Option<SubscriptionId>,
}

impl<'a> Subscription<'a> {
    pub(crate) fn attach(host: &'a dyn Host, handler: DeletionHandler) -> Self {
        let id = host.on_deletion(handler);
        tracing::trace!(subscription = id.0, "attached deletion listener");
        Self { host, id: Some(id) }
    }

    /// Unsubscribe now rather than at drop.
    pub(crate) fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(id) = self.id.take() {
            self.host.off_deletion(id);
            tracing::trace!(subscription = id.0, "detached deletion listener");
        }
    }
}

impl Drop for Subscription<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        detached: Mutex<Vec<SubscriptionId>>,
    }

    impl Host for Recording {
        fn on_deletion(&self, _handler: DeletionHandler) -> SubscriptionId {
            SubscriptionId(7)
        }

        fn off_deletion(&self, id: SubscriptionId) {
            self.detached.lock().unwrap().push(id);
        }
    }

    #[test]
    fn subscription_detaches_exactly_once() {
        let host = Recording::default();
        let sub = Subscription::attach(&host, Arc::new(|_| {}));
        sub.detach();
        assert_eq!(*host.detached.lock().unwrap(), vec![SubscriptionId(7)]);
    }

    #[test]
    fn dropped_subscription_detaches() {
        let host = Recording::default();
        {
            let _sub = Subscription::attach(&host, Arc::new(|_| {}));
        }
        assert_eq!(host.detached.lock().unwrap().len(), 1);
    }
}
