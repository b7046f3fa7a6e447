//! Working-copy state engine for SVN source control integration
//!
//! This crate owns the lifecycle of on-disk checkouts and reconciles each
//! against the client's notion of status:
//!
//! - **Refresh cycle**: one status subprocess in flight per working copy,
//!   bursts of triggers coalesced, complete passes published atomically
//! - **Resource groups**: exclusive partitioning of files into unversioned /
//!   changes / conflicts / changelist groups for the editor UI
//! - **Structural operations**: lock, commit, add, changelist assignment and
//!   branch switching against the trunk/branches/tags layout
//! - **Registry**: one [`Repository`] per working-copy root, resolved from
//!   arbitrary file paths, disposed as a cascade
//!
//! # Architecture
//!
//! `svn-core` sits between the parsing layer and the editor integration:
//!
//! ```text
//!      editor integration (commands, UI)
//!                    |
//!               svn-core
//!               /        \
//!        svn-status    svn-cli
//! ```
//!
//! The subprocess capability is injected as an [`svn_cli::CliInvoker`], so
//! the whole engine runs against scripted output in tests.

pub mod error;
pub mod groups;
pub mod manager;
pub mod naming;
pub mod repository;

pub use error::{Error, Result};
pub use groups::{Classification, GroupId, Resource, ResourceGroup, classify};
pub use manager::SourceControlManager;
pub use naming::{BranchRef, resolve_switch_url};
pub use repository::{LockRefusal, LockReport, RefreshOutcome, Repository};
