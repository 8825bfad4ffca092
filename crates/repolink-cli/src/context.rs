//! Root and policy resolution
//!
//! Turns the global flags into canonical roots, a policy location and engine
//! options. The workspace defaults to the current directory and the project
//! root to the workspace's parent, the layout of a vault kept beside the
//! repositories it mirrors.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use repolink_core::{EngineOptions, FilePolicyStore, GateConfig, LinkEngine, PollingHost};
use repolink_fs::SandboxedRoot;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Everything a command needs to build an engine.
#[derive(Debug, Clone)]
pub struct Context {
    pub project: SandboxedRoot,
    pub workspace: SandboxedRoot,
    pub policy_path: Option<PathBuf>,
    pub gate_timeout: Duration,
    pub poll_interval: Duration,
}

impl Context {
    pub fn resolve(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::from_parts(
            &cwd,
            cli.workspace_root.as_deref(),
            cli.project_root.as_deref(),
            cli.policy.clone(),
            Duration::from_millis(cli.gate_timeout_ms),
            Duration::from_millis(cli.poll_ms),
        )
    }

    fn from_parts(
        cwd: &Path,
        workspace: Option<&Path>,
        project: Option<&Path>,
        policy_path: Option<PathBuf>,
        gate_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Self> {
        let workspace = canonical_root(&cwd.join(workspace.unwrap_or(cwd)), "workspace")?;
        let project = match project {
            Some(project) => canonical_root(&cwd.join(project), "project")?,
            None => {
                let parent = workspace.path().parent().ok_or_else(|| {
                    CliError::user(format!(
                        "workspace root {} has no parent; pass --project-root",
                        workspace.path().display()
                    ))
                })?;
                SandboxedRoot::new(parent)
            }
        };
        tracing::debug!(
            project = %project.path().display(),
            workspace = %workspace.path().display(),
            "resolved roots"
        );

        Ok(Self {
            project,
            workspace,
            policy_path: policy_path.map(|p| cwd.join(p)),
            gate_timeout,
            poll_interval,
        })
    }

    pub fn policy_store(&self) -> FilePolicyStore {
        match &self.policy_path {
            Some(path) => FilePolicyStore::new(path),
            None => FilePolicyStore::in_workspace(self.workspace.path()),
        }
    }

    pub fn options(&self) -> EngineOptions {
        EngineOptions::default().with_gate(GateConfig::default().with_max_elapsed(self.gate_timeout))
    }

    /// An engine with the persisted policy loaded.
    pub fn engine(&self) -> Result<LinkEngine> {
        let engine = LinkEngine::new(
            self.project.clone(),
            self.workspace.clone(),
            Box::new(self.policy_store()),
            Arc::new(PollingHost::with_interval(
                self.workspace.path(),
                self.poll_interval,
            )),
            self.options(),
        );
        engine.load_policy()?;
        Ok(engine)
    }
}

fn canonical_root(path: &Path, role: &str) -> Result<SandboxedRoot> {
    SandboxedRoot::canonical(path).map_err(|e| {
        CliError::user(format!("{} root {} is not accessible: {}", role, path.display(), e))
    })
}
