//! Resource-group classification
//!
//! Partitions one reconciliation pass's status entries into the UI-facing
//! groups. Membership is exclusive: a path lands in exactly one group, with a
//! changelist assignment taking priority over the automatic classification.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use svn_status::{FileStatusEntry, LockDisposition, StatusKind};

/// Identity of a resource group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupId {
    Unversioned,
    Changes,
    Conflicts,
    Changelist(String),
}

impl GroupId {
    /// Human-readable label the editor layer renders as the group header.
    pub fn label(&self) -> &str {
        match self {
            Self::Unversioned => "Unversioned Files",
            Self::Changes => "Changes",
            Self::Conflicts => "Conflicts",
            Self::Changelist(name) => name,
        }
    }
}

/// A file within a group. Identity for UI diffing is the path; the struct is
/// rebuilt on every reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub path: PathBuf,
    pub status: StatusKind,
    pub props: StatusKind,
    pub locked: bool,
    /// Copy source for copied/moved files, when known.
    pub copied_from: Option<String>,
    pub is_directory: bool,
}

impl Resource {
    fn from_entry(entry: &FileStatusEntry) -> Self {
        Self {
            path: entry.path.clone(),
            status: entry.status,
            props: entry.props,
            locked: entry.lock.is_some(),
            copied_from: None,
            is_directory: entry.is_directory,
        }
    }
}

/// Named, ordered bucket of resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub id: GroupId,
    pub resources: Vec<Resource>,
}

impl ResourceGroup {
    fn empty(id: GroupId) -> Self {
        Self {
            id,
            resources: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Result of classifying one pass: the partitioned groups plus the set of
/// paths this working copy holds lock tokens for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub groups: Vec<ResourceGroup>,
    pub locked_paths: BTreeSet<PathBuf>,
}

impl Classification {
    pub fn group(&self, id: &GroupId) -> Option<&ResourceGroup> {
        self.groups.iter().find(|group| &group.id == id)
    }

    /// Changelist names present in the result, in group order.
    pub fn changelist_names(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter_map(|group| match &group.id {
                GroupId::Changelist(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Partition entries into resource groups.
///
/// The three built-in groups always exist, in a fixed order. Changelist
/// groups follow: first the already-known names (so a user-created list that
/// emptied out is retained), then new names in first-seen order.
///
/// Clean entries are hidden from every group, but a held lock on one still
/// feeds `locked_paths`.
pub fn classify(entries: &[FileStatusEntry], existing_changelists: &[String]) -> Classification {
    let mut groups = vec![
        ResourceGroup::empty(GroupId::Unversioned),
        ResourceGroup::empty(GroupId::Changes),
        ResourceGroup::empty(GroupId::Conflicts),
    ];
    for name in existing_changelists {
        if !groups
            .iter()
            .any(|g| g.id == GroupId::Changelist(name.clone()))
        {
            groups.push(ResourceGroup::empty(GroupId::Changelist(name.clone())));
        }
    }

    let mut locked_paths = BTreeSet::new();

    for entry in entries {
        if entry.lock == Some(LockDisposition::Held) {
            locked_paths.insert(entry.path.clone());
        }

        let target = match route(entry) {
            Some(target) => target,
            None => continue,
        };

        let index = match groups.iter().position(|group| group.id == target) {
            Some(index) => index,
            None => {
                groups.push(ResourceGroup::empty(target));
                groups.len() - 1
            }
        };
        groups[index].resources.push(Resource::from_entry(entry));
    }

    Classification {
        groups,
        locked_paths,
    }
}

/// Pick the group an entry belongs to; `None` hides it entirely.
fn route(entry: &FileStatusEntry) -> Option<GroupId> {
    if let Some(name) = &entry.changelist {
        return Some(GroupId::Changelist(name.clone()));
    }

    if entry.status == StatusKind::Conflicted || entry.props == StatusKind::Conflicted {
        return Some(GroupId::Conflicts);
    }

    match entry.status {
        StatusKind::Unversioned | StatusKind::Missing => Some(GroupId::Unversioned),
        _ if entry.is_clean() => None,
        _ => Some(GroupId::Changes),
    }
}
