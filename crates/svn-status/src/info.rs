//! `svn info` output parsing
//!
//! Info output is a block of `Key: Value` lines per target, blocks separated
//! by blank lines. Absence (path not under version control, malformed block)
//! is a typed `None`, never an error: callers turn it into a user-facing
//! message instead of aborting.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Last-changed commit of an info target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub revision: u64,
    pub author: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
}

/// Structured record for one info target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Target path as echoed by the client, when present.
    pub path: Option<String>,
    pub url: String,
    pub relative_url: Option<String>,
    pub repository_root: Option<String>,
    /// Working-copy revision of the target.
    pub revision: Option<u64>,
    /// `file` or `directory`.
    pub node_kind: Option<String>,
    pub commit: Option<CommitInfo>,
    pub lock_owner: Option<String>,
    /// Source URL for copied/moved nodes.
    pub copied_from_url: Option<String>,
}

impl RepoInfo {
    pub fn is_directory(&self) -> bool {
        self.node_kind.as_deref() == Some("directory")
    }

    /// Stable link to this file at its last-changed revision, using the
    /// peg (`p`) and operative (`r`) revision query parameters.
    pub fn permalink(&self) -> Option<String> {
        let revision = self.commit.as_ref()?.revision;
        Some(format!("{}?p={revision}&r={revision}", self.url))
    }
}

/// Parse the first info block. `None` when no block yields a URL.
pub fn parse_info(raw: &str) -> Option<RepoInfo> {
    parse_info_blocks(raw).into_iter().next()
}

/// Parse every block of a multi-target info invocation.
pub fn parse_info_blocks(raw: &str) -> Vec<RepoInfo> {
    let mut blocks = Vec::new();

    for block in raw.split("\n\n") {
        if let Some(info) = parse_block(block) {
            blocks.push(info);
        }
    }

    blocks
}

fn parse_block(block: &str) -> Option<RepoInfo> {
    let mut path = None;
    let mut url = None;
    let mut relative_url = None;
    let mut repository_root = None;
    let mut revision = None;
    let mut node_kind = None;
    let mut commit_revision = None;
    let mut author = None;
    let mut date = None;
    let mut lock_owner = None;
    let mut copied_from_url = None;

    for line in block.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        match key.trim() {
            "Path" => path = Some(value.to_string()),
            "URL" => url = Some(value.to_string()),
            "Relative URL" => relative_url = Some(value.to_string()),
            "Repository Root" => repository_root = Some(value.to_string()),
            "Revision" => revision = value.parse().ok(),
            "Node Kind" => node_kind = Some(value.to_string()),
            "Last Changed Rev" => commit_revision = value.parse().ok(),
            "Last Changed Author" => author = Some(value.to_string()),
            "Last Changed Date" => date = parse_date(value),
            "Lock Owner" => lock_owner = Some(value.to_string()),
            "Copied From URL" => copied_from_url = Some(value.to_string()),
            _ => {}
        }
    }

    // A block without a URL is not a versioned target.
    let url = url?;

    Some(RepoInfo {
        path,
        url,
        relative_url,
        repository_root,
        revision,
        node_kind,
        commit: commit_revision.map(|revision| CommitInfo {
            revision,
            author,
            date,
        }),
        lock_owner,
        copied_from_url,
    })
}

/// Dates print as `2024-01-15 10:30:00 +0000 (Mon, 15 Jan 2024)`; only the
/// machine-readable prefix matters.
fn parse_date(value: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = match value.find(" (") {
        Some(idx) => &value[..idx],
        None => value,
    };
    DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z").ok()
}
