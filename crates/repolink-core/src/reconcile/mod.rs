//! Symlink reconciliation
//!
//! A pass runs four phases in order:
//!
//! 1. **Refresh**: index the project root and filter by policy
//! 2. **Teardown**: remove every indexed repository from the workspace,
//!    recording each removed path
//! 3. **Gate**: wait, with backoff, until the host has reported every removed
//!    path as gone
//! 4. **Link**: materialize the filtered repositories
//!
//! Teardown always completes for all repositories before any link is created.
//! A gate timeout is logged and linking proceeds anyway.

mod link;
mod teardown;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;

use repolink_fs::SandboxedRoot;

use crate::filter::filter;
use crate::host::{Host, Subscription};
use crate::index::RepositoryIndexer;
use crate::policy::ReconciliationPolicy;
use crate::repository::RepositoryPath;
use crate::schedule::{Delay, Limits, schedule};
use crate::trace::SharedTrace;
use crate::{Error, Result};

use link::Linker;
use teardown::teardown;

/// Backoff used while waiting for the host to confirm deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateConfig {
    /// Linear backoff base
    pub base: Duration,
    /// Give up waiting after this long
    pub max_elapsed: Option<Duration>,
    /// Give up waiting after this many retries
    pub max_retries: Option<u32>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(10),
            max_elapsed: Some(Duration::from_secs(10)),
            max_retries: None,
        }
    }
}

impl GateConfig {
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    fn limits(&self) -> Limits {
        Limits {
            max_retries: self.max_retries,
            max_elapsed: self.max_elapsed,
        }
    }
}

/// Engine settings that are not part of the persisted policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// File extensions linked individually, without the dot
    pub document_extensions: Vec<String>,
    pub gate: GateConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            document_extensions: vec!["md".to_string()],
            gate: GateConfig::default(),
        }
    }
}

impl EngineOptions {
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_document_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Result of the Refresh phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Refresh {
    /// Every repository under the project root
    pub indexed: Vec<RepositoryPath>,
    /// The subset the policy selects
    pub filtered: Vec<RepositoryPath>,
}

/// How the Gate phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// The host confirmed every deletion
    Confirmed,
    /// The wait bound expired first
    TimedOut,
}

/// Summary of a completed pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub indexed: Vec<RepositoryPath>,
    pub linked: Vec<RepositoryPath>,
    /// Paths removed during teardown
    pub deleted: usize,
    pub dir_links: usize,
    pub file_links: usize,
    pub gate: GateOutcome,
}

/// Runs reconciliation passes between a project root and a workspace root.
pub struct Reconciler {
    project: SandboxedRoot,
    workspace: SandboxedRoot,
    host: Arc<dyn Host>,
    options: EngineOptions,
    in_flight: AtomicBool,
}

impl Reconciler {
    pub fn new(
        project: SandboxedRoot,
        workspace: SandboxedRoot,
        host: Arc<dyn Host>,
        options: EngineOptions,
    ) -> Self {
        Self {
            project,
            workspace,
            host,
            options,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn project(&self) -> &SandboxedRoot {
        &self.project
    }

    pub fn workspace(&self) -> &SandboxedRoot {
        &self.workspace
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Whether a pass is currently running.
    pub fn is_reconciling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// An indexer over the project root that skips a nested workspace.
    pub fn indexer(&self) -> RepositoryIndexer {
        let indexer = RepositoryIndexer::new(self.project.path());
        let workspace = self.workspace.path();
        if workspace != self.project.path() && self.project.contains(workspace) {
            indexer.exclude(workspace)
        } else {
            indexer
        }
    }

    /// Index and filter, then tell the host.
    pub fn refresh(&self, policy: &ReconciliationPolicy) -> Result<Refresh> {
        let indexed = self.indexer().index()?;
        let filtered = filter(&indexed, policy);
        tracing::info!(
            indexed = indexed.len(),
            filtered = filtered.len(),
            "refreshed repositories"
        );
        self.host.repository_set_changed(&filtered);
        Ok(Refresh { indexed, filtered })
    }

    /// Run one full pass against `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReconcileInProgress`] if another pass on this
    /// reconciler has not finished, and [`Error::OverlappingRoots`] if the
    /// project root is the workspace root or lies inside it. Filesystem
    /// faults abort the pass and are returned; the next pass starts with a
    /// full teardown, so partial state never accumulates.
    pub async fn reconcile(&self, policy: &ReconciliationPolicy) -> Result<ReconcileReport> {
        let _pass = PassGuard::acquire(&self.in_flight)?;
        if self.workspace.contains(self.project.path()) {
            return Err(Error::OverlappingRoots {
                project: self.project.path().to_path_buf(),
                workspace: self.workspace.path().to_path_buf(),
            });
        }

        let Refresh { indexed, filtered } = self.refresh(policy)?;

        let trace = SharedTrace::new();
        let listener = {
            let trace = trace.clone();
            Subscription::attach(
                self.host.as_ref(),
                Arc::new(move |path: &str| trace.lock().record_confirmed(path)),
            )
        };

        let deleted = teardown(&self.workspace, &indexed, &trace)?;
        tracing::info!(deleted, "teardown complete");

        let gate = self.gate(&trace).await;
        listener.detach();

        let linker = Linker::new(
            &self.project,
            &self.workspace,
            policy,
            &self.options.document_extensions,
        );
        let mut dir_links = 0;
        let mut file_links = 0;
        for repo in &filtered {
            let counts = linker.link(repo)?;
            dir_links += counts.dir_links;
            file_links += counts.file_links;
        }

        tracing::info!(
            linked = filtered.len(),
            dir_links,
            file_links,
            "reconciliation complete"
        );
        self.host.presentation_refresh_needed();

        Ok(ReconcileReport {
            indexed,
            linked: filtered,
            deleted,
            dir_links,
            file_links,
            gate,
        })
    }

    async fn gate(&self, trace: &SharedTrace) -> GateOutcome {
        let outcome = schedule(
            || tracing::debug!("host confirmed teardown"),
            || trace.lock().is_settled(),
            Delay::Linear(self.options.gate.base),
            self.options.gate.limits(),
        )
        .await;

        if outcome.is_satisfied() {
            GateOutcome::Confirmed
        } else {
            let snapshot = trace.snapshot();
            tracing::warn!(
                deleted = snapshot.deleted().len(),
                confirmed = snapshot.confirmed().len(),
                "host did not confirm deletions in time, linking anyway"
            );
            GateOutcome::TimedOut
        }
    }
}

/// Holds the single-flight flag for the duration of a pass.
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::ReconcileInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_guard_is_exclusive_and_released_on_drop() {
        let flag = AtomicBool::new(false);
        let guard = PassGuard::acquire(&flag).unwrap();
        assert!(matches!(PassGuard::acquire(&flag), Err(Error::ReconcileInProgress)));
        drop(guard);
        assert!(PassGuard::acquire(&flag).is_ok());
    }

    #[tokio::test]
    async fn project_inside_workspace_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("projects/alpha/.git")).unwrap();

        let reconciler = Reconciler::new(
            SandboxedRoot::new(dir.path().join("projects")),
            SandboxedRoot::new(dir.path()),
            Arc::new(crate::host::NullHost),
            EngineOptions::default(),
        );
        let err = reconciler
            .reconcile(&ReconciliationPolicy::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::OverlappingRoots { .. }));
        assert!(dir.path().join("projects/alpha/.git").exists());
        assert!(!reconciler.is_reconciling());
    }

    #[test]
    fn nested_workspace_is_excluded_from_indexing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("alpha/.git")).unwrap();
        std::fs::create_dir_all(dir.path().join("vault/alpha/.git")).unwrap();

        let reconciler = Reconciler::new(
            SandboxedRoot::new(dir.path()),
            SandboxedRoot::new(dir.path().join("vault")),
            Arc::new(crate::host::NullHost),
            EngineOptions::default(),
        );
        let indexed = reconciler.indexer().index().unwrap();
        assert_eq!(indexed, vec![RepositoryPath::new("alpha").unwrap()]);
    }
}
