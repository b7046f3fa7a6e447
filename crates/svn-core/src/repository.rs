//! Per-working-copy aggregate: refresh cycle and structural operations
//!
//! One [`Repository`] owns one on-disk checkout. It serializes its own
//! reconciliation: at most one status subprocess is in flight per working
//! copy, with bursts of triggers coalesced into a single follow-up pass.
//! Readers only ever observe the result of a *complete* pass; a repository
//! disposed mid-flight lets the pass finish and discards its result.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use svn_cli::{CliInvoker, CliOutput};
use svn_status::{RepoInfo, info, ops, parser};

use crate::groups::{Classification, GroupId, ResourceGroup, classify};
use crate::naming::{BranchRef, resolve_switch_url};
use crate::{Error, Result};

/// Refresh state machine. `Disposed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshState {
    Idle,
    Refreshing,
    RefreshingWithPending,
    Disposed,
}

/// How a `refresh()` call was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// This call ran the pass (and any coalesced follow-ups) to completion.
    Completed,
    /// A pass was already in flight; this trigger was folded into one
    /// follow-up pass owned by the in-flight call.
    Coalesced,
}

/// Per-path outcome of a lock or unlock invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockReport {
    pub granted: Vec<PathBuf>,
    pub refused: Vec<LockRefusal>,
}

impl LockReport {
    pub fn all_granted(&self) -> bool {
        self.refused.is_empty()
    }
}

/// A path the client refused to lock, e.g. already locked by another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRefusal {
    pub path: PathBuf,
    pub owner: Option<String>,
    pub reason: String,
}

/// Branch, URL and revision facts from the working copy root's info record.
#[derive(Debug, Clone)]
struct WorkingCopyInfo {
    url: String,
    repository_root: String,
    revision: Option<u64>,
    branch: Option<BranchRef>,
}

/// Snapshot replaced atomically at the end of each complete pass.
#[derive(Debug, Clone, Default)]
struct Published {
    groups: Vec<ResourceGroup>,
    locked_paths: BTreeSet<PathBuf>,
    /// Changelist names ever observed or assigned, so a list that empties
    /// out keeps its group.
    known_changelists: Vec<String>,
    incoming: Vec<PathBuf>,
    remote_revision: Option<u64>,
}

/// State manager for one working copy.
pub struct Repository {
    root: PathBuf,
    invoker: Arc<dyn CliInvoker>,
    info: Mutex<WorkingCopyInfo>,
    published: Mutex<Published>,
    refresh_state: Mutex<RefreshState>,
    /// Signalled every time the refresh loop drains back to idle (or the
    /// repository is disposed), for callers that must observe a settled pass.
    refresh_settled: Notify,
}

impl Repository {
    /// Open the working copy at `root`.
    ///
    /// Probes for the `.svn` metadata directory, then reads the root's info
    /// record to learn the checkout URL and branch. Both failure modes are
    /// the expected negative [`Error::NotWorkingCopy`]; only transport
    /// failures are more severe.
    pub async fn open(root: impl Into<PathBuf>, invoker: Arc<dyn CliInvoker>) -> Result<Self> {
        let root = root.into();

        let probe = root.join(".svn");
        match tokio::fs::metadata(&probe).await {
            Ok(metadata) if metadata.is_dir() => {}
            _ => return Err(Error::NotWorkingCopy { path: root }),
        }

        let output = invoker.execute(&root, &["info".to_string()]).await?;
        if !output.success() {
            tracing::debug!(root = %root.display(), stderr = %output.stderr.trim(), "Info probe failed");
            return Err(Error::NotWorkingCopy { path: root });
        }
        let Some(record) = info::parse_info(&output.stdout) else {
            return Err(Error::NotWorkingCopy { path: root });
        };

        let repository_root = record
            .repository_root
            .clone()
            .unwrap_or_else(|| record.url.clone());
        let branch = BranchRef::from_url(&record.url, &repository_root);

        tracing::debug!(
            root = %root.display(),
            url = %record.url,
            branch = %branch.as_ref().map(BranchRef::path).unwrap_or_default(),
            "Opened working copy"
        );

        Ok(Self {
            root,
            invoker,
            info: Mutex::new(WorkingCopyInfo {
                url: record.url,
                repository_root,
                revision: record.revision,
                branch,
            }),
            published: Mutex::new(Published::default()),
            refresh_state: Mutex::new(RefreshState::Idle),
            refresh_settled: Notify::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Checkout URL of the working copy root.
    pub fn remote_url(&self) -> String {
        self.info.lock().unwrap().url.clone()
    }

    pub fn repository_root(&self) -> String {
        self.info.lock().unwrap().repository_root.clone()
    }

    /// Working-copy revision as of the last info read.
    pub fn revision(&self) -> Option<u64> {
        self.info.lock().unwrap().revision
    }

    /// Current branch in its `trunk` / `branches/<name>` / `tags/<name>`
    /// form, when the checkout URL matches the layout.
    pub fn current_branch(&self) -> Option<String> {
        self.info
            .lock()
            .unwrap()
            .branch
            .as_ref()
            .map(BranchRef::path)
    }

    /// The groups as of the last complete reconciliation pass.
    pub fn resource_groups(&self) -> Vec<ResourceGroup> {
        self.published.lock().unwrap().groups.clone()
    }

    /// Changelist groups keyed by name.
    pub fn changelists(&self) -> BTreeMap<String, ResourceGroup> {
        self.published
            .lock()
            .unwrap()
            .groups
            .iter()
            .filter_map(|group| match &group.id {
                GroupId::Changelist(name) => Some((name.clone(), group.clone())),
                _ => None,
            })
            .collect()
    }

    /// Paths this working copy holds lock tokens for.
    pub fn locked_paths(&self) -> BTreeSet<PathBuf> {
        self.published.lock().unwrap().locked_paths.clone()
    }

    /// Paths with newer revisions in the repository, from the last remote
    /// scan.
    pub fn incoming_changes(&self) -> Vec<PathBuf> {
        self.published.lock().unwrap().incoming.clone()
    }

    /// Repository revision the last remote scan compared against.
    pub fn remote_revision(&self) -> Option<u64> {
        self.published.lock().unwrap().remote_revision
    }

    pub fn is_disposed(&self) -> bool {
        *self.refresh_state.lock().unwrap() == RefreshState::Disposed
    }

    /// Tear down this repository. Idempotent. An in-flight refresh finishes
    /// but its result is discarded.
    pub fn dispose(&self) {
        let mut state = self.refresh_state.lock().unwrap();
        if *state != RefreshState::Disposed {
            tracing::debug!(root = %self.root.display(), "Disposing repository");
            *state = RefreshState::Disposed;
        }
        drop(state);
        self.refresh_settled.notify_waiters();
    }

    // ------------------------------------------------------------------
    // Refresh cycle
    // ------------------------------------------------------------------

    /// Run one reconciliation pass, coalescing concurrent triggers.
    ///
    /// If a pass is already in flight the trigger is recorded and folded
    /// into a single follow-up pass; at most one status subprocess runs per
    /// repository at any time. The call that owns the loop keeps draining
    /// until a pass completes with no pending trigger.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        {
            let mut state = self.refresh_state.lock().unwrap();
            match *state {
                RefreshState::Disposed => return Err(Error::Disposed),
                RefreshState::Refreshing | RefreshState::RefreshingWithPending => {
                    *state = RefreshState::RefreshingWithPending;
                    return Ok(RefreshOutcome::Coalesced);
                }
                RefreshState::Idle => *state = RefreshState::Refreshing,
            }
        }

        loop {
            let pass = self.reconcile_once().await;

            let mut state = self.refresh_state.lock().unwrap();
            if *state == RefreshState::Disposed {
                // Completed after disposal: discard.
                drop(state);
                self.refresh_settled.notify_waiters();
                return Err(Error::Disposed);
            }

            match pass {
                Err(error) => {
                    *state = RefreshState::Idle;
                    drop(state);
                    self.refresh_settled.notify_waiters();
                    return Err(error);
                }
                Ok(classification) => {
                    self.publish(classification);
                    if *state == RefreshState::RefreshingWithPending {
                        *state = RefreshState::Refreshing;
                        continue;
                    }
                    *state = RefreshState::Idle;
                    drop(state);
                    self.refresh_settled.notify_waiters();
                    return Ok(RefreshOutcome::Completed);
                }
            }
        }
    }

    /// Refresh and, if the trigger was coalesced into an in-flight pass,
    /// wait until that pass drains. Used where callers must observe state no
    /// older than their request, e.g. the tail of a branch switch.
    pub async fn refresh_and_settle(&self) -> Result<()> {
        loop {
            let mut settled = pin!(self.refresh_settled.notified());
            // Register before triggering so the drain's signal cannot be
            // missed.
            settled.as_mut().enable();

            match self.refresh().await? {
                RefreshOutcome::Completed => return Ok(()),
                RefreshOutcome::Coalesced => {
                    settled.await;
                    if self.is_disposed() {
                        return Err(Error::Disposed);
                    }
                }
            }
        }
    }

    /// One full pass: status, parse, enrich, classify.
    async fn reconcile_once(&self) -> Result<Classification> {
        let output = self.expect_success("status", self.run(&["status"]).await?)?;
        let parsed = parser::parse(&output.stdout);
        for warning in &parsed.warnings {
            tracing::warn!(root = %self.root.display(), %warning, "Skipped status line");
        }

        let mut entries = parsed.entries;
        for entry in &mut entries {
            entry.path = self.root.join(&entry.path);
            entry.is_directory = tokio::fs::metadata(&entry.path)
                .await
                .map(|metadata| metadata.is_dir())
                .unwrap_or(false);
        }

        let known = self.published.lock().unwrap().known_changelists.clone();
        let mut classification = classify(&entries, &known);

        let copied: Vec<PathBuf> = entries
            .iter()
            .filter(|entry| entry.copied)
            .map(|entry| entry.path.clone())
            .collect();
        if !copied.is_empty() {
            self.enrich_copy_origins(&copied, &mut classification).await;
        }

        Ok(classification)
    }

    /// Fill `copied_from` for entries carrying copy history, with one
    /// batched info call. Best-effort: failures degrade to plain resources.
    async fn enrich_copy_origins(&self, copied: &[PathBuf], classification: &mut Classification) {
        let mut args = vec!["info".to_string()];
        args.extend(copied.iter().map(|path| path.display().to_string()));

        let output = match self.invoker.execute(&self.root, &args).await {
            Ok(output) if output.success() => output,
            Ok(output) => {
                tracing::warn!(root = %self.root.display(), stderr = %output.stderr.trim(), "Copy-origin lookup failed");
                return;
            }
            Err(error) => {
                tracing::warn!(root = %self.root.display(), %error, "Copy-origin lookup failed");
                return;
            }
        };

        let origins: HashMap<PathBuf, String> = info::parse_info_blocks(&output.stdout)
            .into_iter()
            .filter_map(|record| {
                let path = record.path.as_ref()?;
                let origin = record.copied_from_url?;
                Some((PathBuf::from(path), origin))
            })
            .collect();

        for group in &mut classification.groups {
            for resource in &mut group.resources {
                if let Some(origin) = origins.get(&resource.path) {
                    resource.copied_from = Some(origin.clone());
                }
            }
        }
    }

    /// Atomically replace the published snapshot with a completed pass.
    fn publish(&self, classification: Classification) {
        let mut published = self.published.lock().unwrap();
        for name in classification.changelist_names() {
            if !published.known_changelists.contains(&name) {
                published.known_changelists.push(name);
            }
        }
        published.groups = classification.groups;
        published.locked_paths = classification.locked_paths;
    }

    // ------------------------------------------------------------------
    // Structural operations
    // ------------------------------------------------------------------

    /// Take locks on the given paths.
    ///
    /// Partial failure is a normal result: the report enumerates per-path
    /// grants and refusals. Only a run with no per-path outcome at all (and
    /// a non-zero exit) is an operation error. A refresh follows either way.
    pub async fn lock(&self, paths: &[PathBuf]) -> Result<LockReport> {
        let result = self.lock_inner("lock", paths).await;
        self.trigger_refresh().await;
        result
    }

    /// Release locks on the given paths. Same reporting shape as [`lock`].
    ///
    /// [`lock`]: Repository::lock
    pub async fn unlock(&self, paths: &[PathBuf]) -> Result<LockReport> {
        let result = self.lock_inner("unlock", paths).await;
        self.trigger_refresh().await;
        result
    }

    async fn lock_inner(&self, operation: &str, paths: &[PathBuf]) -> Result<LockReport> {
        let mut args = vec![operation.to_string()];
        args.extend(paths.iter().map(|path| path.display().to_string()));

        let output = self.invoker.execute(&self.root, &args).await?;
        let (granted, refused) = ops::parse_lock_lines(&output.stdout, &output.stderr);

        if granted.is_empty() && refused.is_empty() && !output.success() {
            return Err(Error::Operation {
                operation: operation.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let report = LockReport {
            granted: granted
                .iter()
                .map(|grant| self.resolve_reported_path(paths, &grant.path))
                .collect(),
            refused: refused
                .into_iter()
                .map(|refusal| LockRefusal {
                    path: self.resolve_reported_path(paths, &refusal.path),
                    owner: refusal.owner,
                    reason: refusal.reason,
                })
                .collect(),
        };

        {
            let mut published = self.published.lock().unwrap();
            for path in &report.granted {
                if operation == "lock" {
                    published.locked_paths.insert(path.clone());
                } else {
                    published.locked_paths.remove(path);
                }
            }
        }

        Ok(report)
    }

    /// Map a path echoed by the client (as passed, or repository-absolute in
    /// warnings) back to the requested absolute path.
    fn resolve_reported_path(&self, requested: &[PathBuf], reported: &str) -> PathBuf {
        let candidate = Path::new(reported);
        let relative = reported.trim_start_matches('/');
        requested
            .iter()
            .find(|path| path.as_path() == candidate || path.ends_with(relative))
            .cloned()
            .unwrap_or_else(|| self.root.join(relative))
    }

    /// Schedule unversioned paths for addition. Refreshes regardless of
    /// outcome, since the working copy may have changed even on failure.
    pub async fn add_files(&self, paths: &[PathBuf]) -> Result<()> {
        let mut args = vec!["add".to_string()];
        args.extend(paths.iter().map(|path| path.display().to_string()));

        let result = match self.invoker.execute(&self.root, &args).await {
            Ok(output) => self.expect_success("add", output).map(|_| ()),
            Err(error) => Err(error.into()),
        };
        self.trigger_refresh().await;
        result
    }

    /// Commit the given paths. Returns the committed revision when the
    /// client reported one. Refreshes regardless of outcome: some files may
    /// have been committed before an error aborted the rest.
    pub async fn commit_files(&self, message: &str, paths: &[PathBuf]) -> Result<Option<u64>> {
        let mut args = vec![
            "commit".to_string(),
            "--message".to_string(),
            message.to_string(),
        ];
        args.extend(paths.iter().map(|path| path.display().to_string()));

        let result = match self.invoker.execute(&self.root, &args).await {
            Ok(output) => self
                .expect_success("commit", output)
                .map(|output| ops::parse_commit_revision(&output.stdout)),
            Err(error) => Err(error.into()),
        };
        self.trigger_refresh().await;
        result
    }

    /// Assign paths to a changelist, or clear their assignment with `None`.
    pub async fn assign_changelist(&self, paths: &[PathBuf], name: Option<&str>) -> Result<()> {
        let mut args = vec!["changelist".to_string()];
        match name {
            Some(name) => args.push(name.to_string()),
            None => args.push("--remove".to_string()),
        }
        args.extend(paths.iter().map(|path| path.display().to_string()));

        let output = self.invoker.execute(&self.root, &args).await?;
        let result = self.expect_success("changelist", output).map(|_| ());

        if result.is_ok() {
            if let Some(name) = name {
                // Remember the name now so the group survives even while
                // empty.
                let mut published = self.published.lock().unwrap();
                if !published.known_changelists.contains(&name.to_string()) {
                    published.known_changelists.push(name.to_string());
                }
            }
        }

        self.trigger_refresh().await;
        result
    }

    /// Clear the changelist assignment of the given paths.
    pub async fn remove_from_changelist(&self, paths: &[PathBuf]) -> Result<()> {
        self.assign_changelist(paths, None).await
    }

    /// Switch the working copy to another branch of the fixed layout.
    ///
    /// Resolves the target against the current URL's layout position, runs
    /// the switch, re-reads the root info, then completes a reconciliation
    /// pass *and* a remote-change scan before returning, so callers observe
    /// the new branch and its remote state immediately.
    pub async fn switch_branch(&self, target: &str) -> Result<()> {
        let branch = BranchRef::parse(target).ok_or_else(|| Error::UnknownBranchRef {
            reference: target.to_string(),
        })?;

        let (current_url, repository_root) = {
            let info = self.info.lock().unwrap();
            (info.url.clone(), info.repository_root.clone())
        };
        let url = resolve_switch_url(&current_url, &repository_root, &branch);

        tracing::debug!(root = %self.root.display(), %url, "Switching branch");
        let output = self.run(&["switch", url.as_str()]).await?;
        self.expect_success("switch", output)?;

        self.reload_info().await?;
        self.refresh_and_settle().await?;
        self.scan_remote_changes().await?;
        Ok(())
    }

    /// Re-read the root's info record after a structural change.
    async fn reload_info(&self) -> Result<()> {
        let output = self.expect_success("info", self.run(&["info"]).await?)?;
        let Some(record) = info::parse_info(&output.stdout) else {
            return Err(Error::Operation {
                operation: "info".to_string(),
                exit_code: 0,
                stderr: "unparseable info output".to_string(),
            });
        };

        let mut info = self.info.lock().unwrap();
        if let Some(root) = record.repository_root {
            info.repository_root = root;
        }
        info.branch = BranchRef::from_url(&record.url, &info.repository_root);
        info.url = record.url;
        info.revision = record.revision;
        Ok(())
    }

    /// Compare the working copy against the repository's latest revision and
    /// publish which paths have incoming changes.
    pub async fn scan_remote_changes(&self) -> Result<()> {
        let output =
            self.expect_success("status --show-updates", self.run(&["status", "--show-updates"]).await?)?;
        let remote = parser::parse_remote(&output.stdout);

        let mut published = self.published.lock().unwrap();
        published.incoming = remote
            .incoming
            .iter()
            .map(|path| self.root.join(path))
            .collect();
        published.remote_revision = remote.against_revision;
        Ok(())
    }

    /// Info record for a single path. `Ok(None)` when the path is not under
    /// version control or info cannot be retrieved; only transport failures
    /// are errors.
    pub async fn get_info(&self, path: &Path) -> Result<Option<RepoInfo>> {
        let args = vec!["info".to_string(), path.display().to_string()];
        let output = self.invoker.execute(&self.root, &args).await?;
        if !output.success() {
            tracing::debug!(
                root = %self.root.display(),
                path = %path.display(),
                stderr = %output.stderr.trim(),
                "Info unavailable"
            );
            return Ok(None);
        }
        Ok(info::parse_info(&output.stdout))
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    async fn run(&self, args: &[&str]) -> Result<CliOutput> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        Ok(self.invoker.execute(&self.root, &args).await?)
    }

    fn expect_success(&self, operation: &str, output: CliOutput) -> Result<CliOutput> {
        if output.success() {
            Ok(output)
        } else {
            Err(Error::Operation {
                operation: operation.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }

    /// Post-operation refresh. Failures are logged, not propagated: the
    /// operation's own result is what the caller needs to see.
    async fn trigger_refresh(&self) {
        match self.refresh().await {
            Ok(_) | Err(Error::Disposed) => {}
            Err(error) => {
                tracing::warn!(root = %self.root.display(), %error, "Post-operation refresh failed");
            }
        }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("state", &*self.refresh_state.lock().unwrap())
            .finish_non_exhaustive()
    }
}
