//! Working-copy fixtures and canned CLI output.
//!
//! These build the lowest-realism fixture that satisfies detection logic: a
//! `.svn` marker directory, without a real client or repository behind it.

use std::fs;
use std::path::Path;

/// Creates a minimal `.svn` directory so the path passes the working-copy
/// probe, without initialising a real working copy.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_working_copy(path: &Path) {
    fs::create_dir_all(path.join(".svn"))
        .unwrap_or_else(|e| panic!("fake_working_copy: failed to create .svn: {e}"));
    fs::write(path.join(".svn/format"), "31\n")
        .unwrap_or_else(|e| panic!("fake_working_copy: failed to write format: {e}"));
}

/// Canned `svn info` output for a working-copy root checked out from
/// `{repo_root}/{branch_path}` at the given revision.
pub fn info_output(repo_root: &str, branch_path: &str, revision: u64) -> String {
    format!(
        concat!(
            "Path: .\n",
            "URL: {root}/{branch}\n",
            "Relative URL: ^/{branch}\n",
            "Repository Root: {root}\n",
            "Revision: {rev}\n",
            "Node Kind: directory\n",
            "Last Changed Author: alice\n",
            "Last Changed Rev: {rev}\n",
            "Last Changed Date: 2024-01-15 10:30:00 +0000 (Mon, 15 Jan 2024)\n",
        ),
        root = repo_root,
        branch = branch_path,
        rev = revision,
    )
}
