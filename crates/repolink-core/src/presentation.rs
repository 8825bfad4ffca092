//! Workspace entry classification for presentation layers
//!
//! [`compute_icon`] is a pure function of the engine's last refresh, the
//! policy, and the entry's own file type. Presentation layers call it after
//! each refresh notification; the engine never renders anything itself.

use std::fmt;

use serde::Serialize;

use repolink_fs::is_under;

use crate::policy::ReconciliationPolicy;
use crate::repository::RepositoryPath;

/// How an entry in the workspace tree should be decorated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IconKind {
    /// A linked document
    FileSymlink,
    /// A real file inside a linked repository, not reached through any link
    UnlinkedFile,
    /// A directory link; `configured` is false for links the policy no longer names
    FolderSymlink { configured: bool },
    /// A directory the policy ignores
    Ignored,
    /// Root of a repository the policy selects
    IncludedRepository,
    /// Root of an indexed repository the policy excludes
    ExcludedRepository,
}

impl IconKind {
    /// Whether the entry deserves the user's attention.
    pub fn needs_attention(&self) -> bool {
        match self {
            Self::FileSymlink | Self::IncludedRepository => false,
            Self::FolderSymlink { configured } => !configured,
            Self::UnlinkedFile | Self::Ignored | Self::ExcludedRepository => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::FileSymlink => "file-symlink",
            Self::UnlinkedFile => "unlinked-file",
            Self::FolderSymlink { configured: true } => "folder-symlink",
            Self::FolderSymlink { configured: false } => "stray-folder-symlink",
            Self::Ignored => "ignored",
            Self::IncludedRepository => "included",
            Self::ExcludedRepository => "excluded",
        }
    }
}

impl fmt::Display for IconKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Engine state an icon is computed against.
#[derive(Debug, Clone, Copy)]
pub struct IconContext<'a> {
    pub indexed: &'a [RepositoryPath],
    pub filtered: &'a [RepositoryPath],
    pub policy: &'a ReconciliationPolicy,
}

/// One workspace entry, as observed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryState<'a> {
    /// Workspace-relative, slash-separated
    pub path: &'a str,
    /// The entry (or its link target) is a regular file
    pub is_file: bool,
    /// The entry itself is a symlink
    pub is_symlink: bool,
}

struct Membership<'a> {
    relative: &'a str,
    under_dir_link: bool,
}

fn membership<'a>(ctx: &IconContext<'_>, path: &'a str) -> Option<Membership<'a>> {
    let repo = ctx.filtered.iter().find(|repo| is_under(path, repo.as_str()))?;
    let relative = path
        .strip_prefix(repo.as_str())
        .map(|rest| rest.trim_start_matches('/'))
        .unwrap_or_default();
    let under_dir_link = ctx
        .policy
        .dir_link()
        .iter()
        .any(|link| is_under(relative, link));
    Some(Membership {
        relative,
        under_dir_link,
    })
}

/// Classify a workspace entry. `None` means no decoration.
pub fn compute_icon(ctx: &IconContext<'_>, entry: &EntryState<'_>) -> Option<IconKind> {
    if let Some(member) = membership(ctx, entry.path) {
        if entry.is_file && entry.is_symlink {
            return Some(IconKind::FileSymlink);
        }
        if entry.is_file && !member.under_dir_link {
            return Some(IconKind::UnlinkedFile);
        }
        if entry.is_symlink {
            let configured = ctx.policy.dir_link().iter().any(|link| link == member.relative);
            return Some(IconKind::FolderSymlink { configured });
        }
        if ctx.policy.dir_ignore().iter().any(|ignored| ignored == member.relative) {
            return Some(IconKind::Ignored);
        }
    }

    if ctx.filtered.iter().any(|repo| repo == entry.path) {
        Some(IconKind::IncludedRepository)
    } else if ctx.indexed.iter().any(|repo| repo == entry.path) {
        Some(IconKind::ExcludedRepository)
    } else {
        None
    }
}
