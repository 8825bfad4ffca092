//! [`MemoryPolicyStore`]: a policy store that never touches disk.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use repolink_core::{Error, PolicyStore, ReconciliationPolicy, Result};

/// Holds the "persisted" policy in memory and counts saves.
#[derive(Default)]
pub struct MemoryPolicyStore {
    stored: Mutex<Option<ReconciliationPolicy>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `policy`.
    pub fn with(policy: ReconciliationPolicy) -> Self {
        Self {
            stored: Mutex::new(Some(policy)),
            ..Self::default()
        }
    }

    /// Make every later save fail with [`Error::PolicyStore`].
    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<ReconciliationPolicy> {
        self.stored.lock().unwrap().clone()
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn load(&self) -> Result<ReconciliationPolicy> {
        Ok(self.stored().unwrap_or_default())
    }

    fn save(&self, policy: &ReconciliationPolicy) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::PolicyStore {
                message: "save rejected by test store".to_string(),
            });
        }
        *self.stored.lock().unwrap() = Some(policy.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
