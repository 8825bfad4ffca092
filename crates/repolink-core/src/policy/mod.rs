//! Reconciliation policy
//!
//! The policy is a closed set of fields. List-valued fields are addressed by
//! [`ListSetting`], boolean fields by [`ToggleSetting`], and every mutation is
//! a [`PolicyUpdate`], so no field is ever looked up by a runtime string key.

mod store;

pub use store::{FilePolicyStore, PolicyStore};

use std::fmt;

use serde::{Deserialize, Serialize};

use repolink_fs::normalize_setting_path;

use crate::{Error, Result};

/// Which repositories are linked, and which of their resources.
///
/// Persisted as a small JSON blob; unknown keys are ignored and missing keys
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconciliationPolicy {
    #[serde(rename = "repositoryDirIgnore")]
    dir_ignore: Vec<String>,
    #[serde(rename = "repositoryDirLink")]
    dir_link: Vec<String>,
    repository_ignore: Vec<String>,
    repository_include: Vec<String>,
    is_whitelist: bool,
    #[serde(rename = "shouldSymlinkOnStart")]
    symlink_on_start: bool,
}

impl Default for ReconciliationPolicy {
    fn default() -> Self {
        Self {
            dir_ignore: vec!["node_modules".into(), ".git".into()],
            dir_link: vec!["docs".into()],
            repository_ignore: Vec::new(),
            repository_include: Vec::new(),
            is_whitelist: true,
            symlink_on_start: false,
        }
    }
}

/// List-valued policy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListSetting {
    /// Subpaths within any repository that are never descended into
    DirIgnore,
    /// Subpaths within any repository linked wholesale as directories
    DirLink,
    /// Repositories excluded in blacklist mode
    RepositoryIgnore,
    /// Repositories included in whitelist mode
    RepositoryInclude,
}

impl ListSetting {
    pub const ALL: [ListSetting; 4] = [
        Self::DirIgnore,
        Self::DirLink,
        Self::RepositoryIgnore,
        Self::RepositoryInclude,
    ];

    /// The persisted key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::DirIgnore => "repositoryDirIgnore",
            Self::DirLink => "repositoryDirLink",
            Self::RepositoryIgnore => "repositoryIgnore",
            Self::RepositoryInclude => "repositoryInclude",
        }
    }
}

impl fmt::Display for ListSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Boolean policy fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToggleSetting {
    /// Whitelist mode: only `RepositoryInclude` is linked
    IsWhitelist,
    /// Reconcile automatically when the engine starts
    SymlinkOnStart,
}

impl ToggleSetting {
    pub const ALL: [ToggleSetting; 2] = [Self::IsWhitelist, Self::SymlinkOnStart];

    /// The persisted key for this field.
    pub fn key(&self) -> &'static str {
        match self {
            Self::IsWhitelist => "isWhitelist",
            Self::SymlinkOnStart => "shouldSymlinkOnStart",
        }
    }
}

impl fmt::Display for ToggleSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A single change to the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyUpdate {
    /// Replace a whole list
    SetList(ListSetting, Vec<String>),
    /// Add one item unless already present
    AddListItem(ListSetting, String),
    /// Remove one item if present
    RemoveListItem(ListSetting, String),
    /// Set a boolean field
    SetToggle(ToggleSetting, bool),
}

impl ReconciliationPolicy {
    /// Read a list-valued field.
    pub fn list(&self, setting: ListSetting) -> &[String] {
        match setting {
            ListSetting::DirIgnore => &self.dir_ignore,
            ListSetting::DirLink => &self.dir_link,
            ListSetting::RepositoryIgnore => &self.repository_ignore,
            ListSetting::RepositoryInclude => &self.repository_include,
        }
    }

    /// Read a boolean field.
    pub fn toggle(&self, setting: ToggleSetting) -> bool {
        match setting {
            ToggleSetting::IsWhitelist => self.is_whitelist,
            ToggleSetting::SymlinkOnStart => self.symlink_on_start,
        }
    }

    pub fn dir_ignore(&self) -> &[String] {
        &self.dir_ignore
    }

    pub fn dir_link(&self) -> &[String] {
        &self.dir_link
    }

    pub fn repository_ignore(&self) -> &[String] {
        &self.repository_ignore
    }

    pub fn repository_include(&self) -> &[String] {
        &self.repository_include
    }

    pub fn is_whitelist(&self) -> bool {
        self.is_whitelist
    }

    pub fn symlink_on_start(&self) -> bool {
        self.symlink_on_start
    }

    /// Apply one update. Returns whether the policy changed.
    pub fn apply(&mut self, update: PolicyUpdate) -> Result<bool> {
        match update {
            PolicyUpdate::SetList(setting, items) => {
                let mut cleaned = Vec::with_capacity(items.len());
                for item in &items {
                    let value = normalize_item(item)?;
                    if !cleaned.contains(&value) {
                        cleaned.push(value);
                    }
                }
                let list = self.list_mut(setting);
                let changed = *list != cleaned;
                *list = cleaned;
                Ok(changed)
            }
            PolicyUpdate::AddListItem(setting, item) => {
                let value = normalize_item(&item)?;
                let list = self.list_mut(setting);
                if list.contains(&value) {
                    return Ok(false);
                }
                list.push(value);
                Ok(true)
            }
            PolicyUpdate::RemoveListItem(setting, item) => {
                let value = normalize_setting_path(&item);
                let list = self.list_mut(setting);
                let before = list.len();
                list.retain(|existing| *existing != value);
                Ok(list.len() != before)
            }
            PolicyUpdate::SetToggle(setting, value) => {
                let field = match setting {
                    ToggleSetting::IsWhitelist => &mut self.is_whitelist,
                    ToggleSetting::SymlinkOnStart => &mut self.symlink_on_start,
                };
                let changed = *field != value;
                *field = value;
                Ok(changed)
            }
        }
    }

    /// Builder form of [`apply`](Self::apply) for a whole list.
    pub fn with_list<I, S>(mut self, setting: ListSetting, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items = items.into_iter().map(Into::into).collect();
        self.apply(PolicyUpdate::SetList(setting, items))?;
        Ok(self)
    }

    /// Builder form of [`apply`](Self::apply) for a toggle.
    pub fn with_toggle(mut self, setting: ToggleSetting, value: bool) -> Self {
        match setting {
            ToggleSetting::IsWhitelist => self.is_whitelist = value,
            ToggleSetting::SymlinkOnStart => self.symlink_on_start = value,
        }
        self
    }

    /// Normalize every stored list item, dropping blanks and duplicates.
    ///
    /// Applied to policies read from storage, which may have been hand-edited.
    pub fn normalized(mut self) -> Self {
        for setting in ListSetting::ALL {
            let list = self.list_mut(setting);
            let mut cleaned: Vec<String> = Vec::with_capacity(list.len());
            for item in list.drain(..) {
                let value = normalize_setting_path(&item);
                if !value.is_empty() && !cleaned.contains(&value) {
                    cleaned.push(value);
                }
            }
            *list = cleaned;
        }
        self
    }

    fn list_mut(&mut self, setting: ListSetting) -> &mut Vec<String> {
        match setting {
            ListSetting::DirIgnore => &mut self.dir_ignore,
            ListSetting::DirLink => &mut self.dir_link,
            ListSetting::RepositoryIgnore => &mut self.repository_ignore,
            ListSetting::RepositoryInclude => &mut self.repository_include,
        }
    }
}

fn normalize_item(item: &str) -> Result<String> {
    let value = normalize_setting_path(item);
    if value.is_empty() {
        return Err(Error::EmptySettingValue {
            value: item.to_string(),
        });
    }
    Ok(value)
}
