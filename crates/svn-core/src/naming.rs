//! Branch references against the conventional trunk/branches/tags layout

use std::fmt;

/// A branch-like location in the standard repository layout.
///
/// Displayed and parsed in the repository-relative form users type:
/// `trunk`, `branches/<name>`, `tags/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchRef {
    Trunk,
    Branch(String),
    Tag(String),
}

impl BranchRef {
    /// Parse a user-supplied reference. `None` for anything outside the
    /// fixed layout.
    pub fn parse(reference: &str) -> Option<Self> {
        let reference = reference.trim_matches('/');
        if reference == "trunk" {
            return Some(Self::Trunk);
        }
        if let Some(name) = reference.strip_prefix("branches/") {
            if !name.is_empty() && !name.contains('/') {
                return Some(Self::Branch(name.to_string()));
            }
        }
        if let Some(name) = reference.strip_prefix("tags/") {
            if !name.is_empty() && !name.contains('/') {
                return Some(Self::Tag(name.to_string()));
            }
        }
        None
    }

    /// Repository-relative path of this reference.
    pub fn path(&self) -> String {
        match self {
            Self::Trunk => "trunk".to_string(),
            Self::Branch(name) => format!("branches/{name}"),
            Self::Tag(name) => format!("tags/{name}"),
        }
    }

    /// Derive the reference a working-copy URL is checked out from.
    ///
    /// Tolerates a project prefix between the repository root and the layout
    /// marker (`{root}/project/trunk`), scanning segments for the first
    /// marker.
    pub fn from_url(url: &str, repository_root: &str) -> Option<Self> {
        let relative = url
            .strip_prefix(repository_root)?
            .trim_matches('/');
        let mut segments = relative.split('/');

        while let Some(segment) = segments.next() {
            match segment {
                "trunk" => return Some(Self::Trunk),
                "branches" => {
                    return segments.next().map(|name| Self::Branch(name.to_string()));
                }
                "tags" => {
                    return segments.next().map(|name| Self::Tag(name.to_string()));
                }
                _ => {}
            }
        }
        None
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Compute the URL to switch to, preserving whatever prefix sits between the
/// repository root and the current URL's layout marker.
///
/// With no marker in the current URL the target is resolved directly under
/// the repository root.
pub fn resolve_switch_url(current_url: &str, repository_root: &str, target: &BranchRef) -> String {
    let root = repository_root.trim_end_matches('/');

    let prefix = current_url
        .strip_prefix(repository_root)
        .map(|relative| relative.trim_matches('/'))
        .map(|relative| {
            let segments: Vec<&str> = relative.split('/').collect();
            let marker = segments
                .iter()
                .position(|s| matches!(*s, "trunk" | "branches" | "tags"));
            match marker {
                Some(idx) => segments[..idx].join("/"),
                None => String::new(),
            }
        })
        .unwrap_or_default();

    if prefix.is_empty() {
        format!("{root}/{}", target.path())
    } else {
        format!("{root}/{prefix}/{}", target.path())
    }
}
