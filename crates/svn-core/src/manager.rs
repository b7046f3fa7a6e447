//! Registry of open repositories
//!
//! Explicitly owned and explicitly disposed: the manager is constructed with
//! its invoker and passed by reference, never held as ambient global state.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use svn_cli::CliInvoker;

use crate::repository::Repository;
use crate::{Error, Result};

/// Registry of open [`Repository`] instances keyed by working-copy root.
pub struct SourceControlManager {
    invoker: Arc<dyn CliInvoker>,
    repositories: Mutex<BTreeMap<PathBuf, Arc<Repository>>>,
}

impl SourceControlManager {
    pub fn new(invoker: Arc<dyn CliInvoker>) -> Self {
        Self {
            invoker,
            repositories: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open the working copy containing `path`, or return the instance
    /// already open for its root.
    ///
    /// Idempotent per root: there is exactly one [`Repository`] per working
    /// copy at any time. A path outside any working copy is a normal
    /// `Ok(None)`, never an error.
    pub async fn try_open_repository(&self, path: &Path) -> Result<Option<Arc<Repository>>> {
        let Some(root) = find_working_copy_root(path) else {
            return Ok(None);
        };
        let root = dunce::canonicalize(&root).unwrap_or(root);

        if let Some(existing) = self.repositories.lock().unwrap().get(&root) {
            return Ok(Some(existing.clone()));
        }

        match Repository::open(root.clone(), self.invoker.clone()).await {
            Ok(repository) => {
                let repository = Arc::new(repository);
                let mut repositories = self.repositories.lock().unwrap();
                match repositories.entry(root) {
                    // Lost the race to a concurrent open; keep the first
                    // instance.
                    Entry::Occupied(existing) => {
                        repository.dispose();
                        Ok(Some(existing.get().clone()))
                    }
                    Entry::Vacant(slot) => Ok(Some(slot.insert(repository).clone())),
                }
            }
            Err(Error::NotWorkingCopy { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Resolve a path to the open repository owning it, by longest matching
    /// root. `None` when no open root contains the path.
    pub fn repository_for_path(&self, path: &Path) -> Option<Arc<Repository>> {
        let canonical = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let repositories = self.repositories.lock().unwrap();
        repositories
            .iter()
            .filter(|(root, _)| canonical.starts_with(root))
            .max_by_key(|(root, _)| root.components().count())
            .map(|(_, repository)| repository.clone())
    }

    /// All open repositories, in root order.
    pub fn repositories(&self) -> Vec<Arc<Repository>> {
        self.repositories.lock().unwrap().values().cloned().collect()
    }

    /// Close and dispose the repository at `root`. Returns whether one was
    /// open.
    pub fn close_repository(&self, root: &Path) -> bool {
        let canonical = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let removed = self.repositories.lock().unwrap().remove(&canonical);
        match removed {
            Some(repository) => {
                repository.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every open repository and empty the registry.
    pub fn dispose(&self) {
        let repositories = std::mem::take(&mut *self.repositories.lock().unwrap());
        for repository in repositories.into_values() {
            repository.dispose();
        }
    }
}

impl Drop for SourceControlManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Walk `path` and its ancestors for the first directory holding `.svn`
/// metadata.
fn find_working_copy_root(path: &Path) -> Option<PathBuf> {
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.join(".svn").is_dir() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
