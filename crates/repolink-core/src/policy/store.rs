//! Policy persistence

use std::path::Path;
use std::sync::Arc;

use repolink_fs::{ConfigStore, NormalizedPath, WellKnownPath};

use super::ReconciliationPolicy;
use crate::Result;

/// Loads and saves the persisted policy blob.
pub trait PolicyStore: Send + Sync {
    /// Load the policy, returning defaults when nothing has been saved yet.
    fn load(&self) -> Result<ReconciliationPolicy>;

    /// Persist the policy.
    fn save(&self, policy: &ReconciliationPolicy) -> Result<()>;
}

impl<T: PolicyStore + ?Sized> PolicyStore for Arc<T> {
    fn load(&self) -> Result<ReconciliationPolicy> {
        (**self).load()
    }

    fn save(&self, policy: &ReconciliationPolicy) -> Result<()> {
        (**self).save(policy)
    }
}

/// Policy stored in a JSON, TOML or YAML file, chosen by extension.
#[derive(Debug, Clone)]
pub struct FilePolicyStore {
    path: NormalizedPath,
    store: ConfigStore,
}

impl FilePolicyStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: NormalizedPath::new(path),
            store: ConfigStore::new(),
        }
    }

    /// The default location, `<workspace>/.repolink/policy.json`.
    ///
    /// Saves are refused if any directory between the workspace root and the
    /// file is a symlink, so the policy can never be written into a project.
    pub fn in_workspace(workspace: impl AsRef<Path>) -> Self {
        let workspace = workspace.as_ref();
        let path = workspace
            .join(WellKnownPath::StateDir)
            .join(WellKnownPath::PolicyFile);
        Self {
            path: NormalizedPath::new(path),
            store: ConfigStore::new().within(workspace),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

impl PolicyStore for FilePolicyStore {
    fn load(&self) -> Result<ReconciliationPolicy> {
        let policy: ReconciliationPolicy = self.store.load_or_default(&self.path)?;
        tracing::debug!(path = %self.path, "loaded policy");
        Ok(policy.normalized())
    }

    fn save(&self, policy: &ReconciliationPolicy) -> Result<()> {
        self.store.save(&self.path, policy)?;
        tracing::debug!(path = %self.path, "saved policy");
        Ok(())
    }
}
