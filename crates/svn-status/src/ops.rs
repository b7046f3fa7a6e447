//! Result-line parsing for mutating operations
//!
//! Lock and commit report per-path outcomes as free-form sentences on stdout
//! and warnings on stderr, with an exit code of zero even when some paths
//! were refused. These parsers recover the per-path structure.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static GRANTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^'(?P<path>.+)' (?:locked by user '(?P<owner>[^']+)'|unlocked)\.?$")
        .expect("static regex")
});

static REFUSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^svn: warning: W\d+: (?P<reason>.*?Path '(?P<path>[^']+)'.*)$")
        .expect("static regex")
});

static REFUSED_OWNER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"user '(?P<owner>[^']+)'").expect("static regex"));

static COMMITTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Committed revision (?P<rev>\d+)\.").expect("static regex"));

/// A path the client granted a lock (or unlock) for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockGranted {
    /// Path as echoed by the client.
    pub path: String,
    /// Lock owner, present for lock but not unlock lines.
    pub owner: Option<String>,
}

/// A path the client refused, e.g. already locked by another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRefused {
    /// Path as echoed in the warning, typically repository-absolute.
    pub path: String,
    /// Full warning text for user display.
    pub reason: String,
    /// The competing lock's owner, when the warning names one.
    pub owner: Option<String>,
}

/// Split lock/unlock output into granted and refused paths.
pub fn parse_lock_lines(stdout: &str, stderr: &str) -> (Vec<LockGranted>, Vec<LockRefused>) {
    let granted = stdout
        .lines()
        .filter_map(|line| {
            let captures = GRANTED.captures(line.trim())?;
            Some(LockGranted {
                path: captures["path"].to_string(),
                owner: captures.name("owner").map(|m| m.as_str().to_string()),
            })
        })
        .collect();

    let refused = stderr
        .lines()
        .filter_map(|line| {
            let captures = REFUSED.captures(line.trim())?;
            let reason = captures["reason"].to_string();
            Some(LockRefused {
                path: captures["path"].to_string(),
                owner: REFUSED_OWNER
                    .captures(&reason)
                    .map(|m| m["owner"].to_string()),
                reason,
            })
        })
        .collect();

    (granted, refused)
}

/// Revision number from `Committed revision N.`, if the commit got that far.
pub fn parse_commit_revision(stdout: &str) -> Option<u64> {
    COMMITTED
        .captures_iter(stdout)
        .last()
        .and_then(|captures| captures["rev"].parse().ok())
}
