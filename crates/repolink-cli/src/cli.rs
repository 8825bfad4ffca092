//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use repolink_core::{ListSetting, ToggleSetting};

/// repolink - Mirror selected repository documents into a workspace as symlinks
#[derive(Parser, Debug)]
#[command(name = "repolink")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace root that links are created in [default: current directory]
    #[arg(long, global = true, env = "REPOLINK_WORKSPACE")]
    pub workspace_root: Option<PathBuf>,

    /// Project root scanned for repositories [default: parent of the workspace root]
    #[arg(long, global = true, env = "REPOLINK_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Policy file (.json, .toml or .yaml) [default: <workspace>/.repolink/policy.json]
    #[arg(long, global = true, env = "REPOLINK_POLICY")]
    pub policy: Option<PathBuf>,

    /// Longest wait for deletion confirmations before linking anyway
    #[arg(long, global = true, default_value_t = 10_000)]
    pub gate_timeout_ms: u64,

    /// Workspace rescan interval while waiting for confirmations
    #[arg(long, global = true, default_value_t = 25)]
    pub poll_ms: u64,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List repositories under the project root
    Index {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Tear down and relink the workspace
    Reconcile {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Load the policy and reconcile if shouldSymlinkOnStart is set
    Start {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show how each workspace entry relates to the policy
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Inspect or change the reconciliation policy
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   repolink completions bash > ~/.local/share/bash-completion/completions/repolink
    ///   repolink completions zsh > ~/.zfunc/_repolink
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Policy subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PolicyAction {
    /// Print the current policy
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Add an item to a list setting
    Add {
        #[arg(value_enum)]
        setting: ListArg,
        item: String,
        /// Reconcile after saving
        #[arg(long)]
        reconcile: bool,
    },

    /// Remove an item from a list setting
    Remove {
        #[arg(value_enum)]
        setting: ListArg,
        item: String,
        /// Reconcile after saving
        #[arg(long)]
        reconcile: bool,
    },

    /// Replace a whole list setting
    Replace {
        #[arg(value_enum)]
        setting: ListArg,
        items: Vec<String>,
        /// Reconcile after saving
        #[arg(long)]
        reconcile: bool,
    },

    /// Set a boolean setting
    Set {
        #[arg(value_enum)]
        setting: ToggleArg,
        #[arg(action = ArgAction::Set)]
        value: bool,
        /// Reconcile after saving
        #[arg(long)]
        reconcile: bool,
    },
}

impl PolicyAction {
    /// Whether the user asked for a pass after the change.
    pub fn reconcile_after(&self) -> bool {
        match self {
            Self::Show { .. } => false,
            Self::Add { reconcile, .. }
            | Self::Remove { reconcile, .. }
            | Self::Replace { reconcile, .. }
            | Self::Set { reconcile, .. } => *reconcile,
        }
    }
}

/// List settings as named on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListArg {
    DirIgnore,
    DirLink,
    RepositoryIgnore,
    RepositoryInclude,
}

impl From<ListArg> for ListSetting {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::DirIgnore => ListSetting::DirIgnore,
            ListArg::DirLink => ListSetting::DirLink,
            ListArg::RepositoryIgnore => ListSetting::RepositoryIgnore,
            ListArg::RepositoryInclude => ListSetting::RepositoryInclude,
        }
    }
}

/// Boolean settings as named on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleArg {
    Whitelist,
    SymlinkOnStart,
}

impl From<ToggleArg> for ToggleSetting {
    fn from(arg: ToggleArg) -> Self {
        match arg {
            ToggleArg::Whitelist => ToggleSetting::IsWhitelist,
            ToggleArg::SymlinkOnStart => ToggleSetting::SymlinkOnStart,
        }
    }
}
