//! Raw status observations for single files

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One column of the short status format.
///
/// Used both for the content column and the property column; the property
/// column only ever carries `Normal`, `Modified` or `Conflicted` in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Normal,
    Added,
    Conflicted,
    Deleted,
    Ignored,
    Missing,
    Modified,
    Obstructed,
    Replaced,
    External,
    Unversioned,
}

impl StatusKind {
    /// Map a short-status column character. `None` for characters this
    /// parser does not understand (the caller records a warning).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Self::Normal),
            'A' => Some(Self::Added),
            'C' => Some(Self::Conflicted),
            'D' => Some(Self::Deleted),
            'I' => Some(Self::Ignored),
            '!' => Some(Self::Missing),
            'M' => Some(Self::Modified),
            '~' => Some(Self::Obstructed),
            'R' => Some(Self::Replaced),
            'X' => Some(Self::External),
            '?' => Some(Self::Unversioned),
            _ => None,
        }
    }
}

/// Lock column of the short status format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockDisposition {
    /// `K` — locked in this working copy.
    Held,
    /// `O` — locked by someone else.
    OtherUser,
    /// `T` — our token exists but the lock was stolen.
    Stolen,
    /// `B` — our token exists but the lock was broken.
    Broken,
}

impl LockDisposition {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'K' => Some(Self::Held),
            'O' => Some(Self::OtherUser),
            'T' => Some(Self::Stolen),
            'B' => Some(Self::Broken),
            _ => None,
        }
    }
}

/// One file's status as reported by a single `svn status` run.
///
/// Entries are produced fresh on every parse and never mutated in place;
/// a refresh always yields a full replacement set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatusEntry {
    /// Path exactly as printed, relative to the status invocation's
    /// working directory.
    pub path: PathBuf,

    /// Content status (first column).
    pub status: StatusKind,

    /// Property status (second column).
    pub props: StatusKind,

    /// Lock column, if any.
    pub lock: Option<LockDisposition>,

    /// Copy/move history marker (`+` in the fourth column).
    pub copied: bool,

    /// Changelist this entry was listed under, from the section markers in
    /// the status output.
    pub changelist: Option<String>,

    /// Whether the path is a directory. The short format does not say, so
    /// the parser leaves this `false`; the repository layer fills it in from
    /// the filesystem during reconciliation.
    pub is_directory: bool,
}

impl FileStatusEntry {
    pub fn new(path: impl Into<PathBuf>, status: StatusKind) -> Self {
        Self {
            path: path.into(),
            status,
            props: StatusKind::Normal,
            lock: None,
            copied: false,
            changelist: None,
            is_directory: false,
        }
    }

    /// True when neither content nor properties diverge from the pristine
    /// state. Such entries are hidden from every resource group.
    pub fn is_clean(&self) -> bool {
        matches!(
            self.status,
            StatusKind::Normal | StatusKind::Ignored | StatusKind::External
        ) && self.props == StatusKind::Normal
    }
}
