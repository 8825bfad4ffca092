//! LinkEngine facade
//!
//! Owns the current policy and the last refresh, and exposes the operations
//! hosts call: index, reconcile, policy updates and entry classification.

use std::fs;
use std::io::ErrorKind;
use std::sync::{Arc, PoisonError, RwLock};

use repolink_fs::{SandboxedRoot, sanitize_relative};

use crate::filter::filter;
use crate::host::Host;
use crate::policy::{PolicyStore, PolicyUpdate, ReconciliationPolicy};
use crate::presentation::{EntryState, IconContext, IconKind, compute_icon};
use crate::reconcile::{EngineOptions, ReconcileReport, Reconciler, Refresh};
use crate::repository::RepositoryPath;
use crate::{Error, Result};

/// Keeps a workspace's symlink layout in step with a project root.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use repolink_core::{EngineOptions, FilePolicyStore, LinkEngine, PollingHost};
/// use repolink_fs::SandboxedRoot;
///
/// # async fn run() -> repolink_core::Result<()> {
/// let workspace = SandboxedRoot::new("/home/me/projects/vault");
/// let engine = LinkEngine::new(
///     SandboxedRoot::new("/home/me/projects"),
///     workspace.clone(),
///     Box::new(FilePolicyStore::in_workspace(workspace.path())),
///     Arc::new(PollingHost::new(workspace.path())),
///     EngineOptions::default(),
/// );
/// engine.start().await?;
/// let report = engine.reconcile().await?;
/// println!("linked {} repositories", report.linked.len());
/// # Ok(())
/// # }
/// ```
pub struct LinkEngine {
    reconciler: Reconciler,
    store: Box<dyn PolicyStore>,
    policy: RwLock<ReconciliationPolicy>,
    repositories: RwLock<Refresh>,
}

impl LinkEngine {
    /// Create an engine with the default policy. Call [`start`](Self::start)
    /// to load the persisted one.
    pub fn new(
        project: SandboxedRoot,
        workspace: SandboxedRoot,
        store: Box<dyn PolicyStore>,
        host: Arc<dyn Host>,
        options: EngineOptions,
    ) -> Self {
        Self {
            reconciler: Reconciler::new(project, workspace, host, options),
            store,
            policy: RwLock::new(ReconciliationPolicy::default()),
            repositories: RwLock::new(Refresh::default()),
        }
    }

    pub fn project(&self) -> &SandboxedRoot {
        self.reconciler.project()
    }

    pub fn workspace(&self) -> &SandboxedRoot {
        self.reconciler.workspace()
    }

    pub fn is_reconciling(&self) -> bool {
        self.reconciler.is_reconciling()
    }

    /// A copy of the current policy.
    pub fn policy(&self) -> ReconciliationPolicy {
        self.policy.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The repository sets from the last refresh or pass.
    pub fn repositories(&self) -> Refresh {
        self.repositories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load the persisted policy, refresh, and reconcile if the policy asks
    /// for it on start.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be loaded, the project root is
    /// missing, or the startup pass fails.
    pub async fn start(&self) -> Result<Option<ReconcileReport>> {
        self.load_policy()?;
        self.refresh()?;

        if self.policy().symlink_on_start() {
            tracing::info!("reconciling on start");
            return self.reconcile().await.map(Some);
        }
        Ok(None)
    }

    /// Replace the in-memory policy with the persisted one.
    pub fn load_policy(&self) -> Result<ReconciliationPolicy> {
        let loaded = self.store.load()?;
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = loaded.clone();
        Ok(loaded)
    }

    /// Every repository under the project root. Read-only.
    pub fn index_repositories(&self) -> Result<Vec<RepositoryPath>> {
        self.reconciler.indexer().index()
    }

    /// Re-index and re-filter, updating the cached sets and notifying the host.
    pub fn refresh(&self) -> Result<Refresh> {
        let refresh = self.reconciler.refresh(&self.policy())?;
        *self
            .repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner) = refresh.clone();
        Ok(refresh)
    }

    /// Run a full reconciliation pass against the current policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReconcileInProgress`] while another pass is pending,
    /// or the first filesystem fault encountered.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let policy = self.policy();
        let report = self.reconciler.reconcile(&policy).await?;
        *self
            .repositories
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Refresh {
            indexed: report.indexed.clone(),
            filtered: report.linked.clone(),
        };
        Ok(report)
    }

    /// Apply `updates` in order, persist, and swap in the result.
    ///
    /// Nothing is persisted or swapped if any update is rejected. The caller
    /// is expected to reconcile afterwards. Returns whether anything changed.
    pub fn update_policy(&self, updates: impl IntoIterator<Item = PolicyUpdate>) -> Result<bool> {
        let mut next = self.policy();
        let mut changed = false;
        for update in updates {
            changed |= next.apply(update)?;
        }
        if !changed {
            return Ok(false);
        }

        self.store.save(&next)?;
        {
            let mut repositories = self
                .repositories
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            repositories.filtered = filter(&repositories.indexed, &next);
        }
        *self.policy.write().unwrap_or_else(PoisonError::into_inner) = next;

        tracing::info!("policy updated");
        self.reconciler.host().presentation_refresh_needed();
        Ok(true)
    }

    /// Classify the workspace entry at `path`. `None` if it does not exist or
    /// needs no decoration.
    pub fn describe(&self, path: &str) -> Result<Option<IconKind>> {
        let path = sanitize_relative(path);
        let absolute = self.workspace().resolve(&path);
        let link = match fs::symlink_metadata(&absolute) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(absolute, e)),
        };
        let is_symlink = link.file_type().is_symlink();
        let is_file = if is_symlink {
            match fs::metadata(&absolute) {
                Ok(target) => target.is_file(),
                // Dangling link
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(Error::io(absolute, e)),
            }
        } else {
            link.is_file()
        };

        let policy = self.policy();
        let repositories = self.repositories();
        let ctx = IconContext {
            indexed: &repositories.indexed,
            filtered: &repositories.filtered,
            policy: &policy,
        };
        Ok(compute_icon(
            &ctx,
            &EntryState {
                path: &path,
                is_file,
                is_symlink,
            },
        ))
    }
}
