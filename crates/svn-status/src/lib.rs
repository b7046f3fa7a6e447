//! Parsers for svn client output
//!
//! Everything here is a pure function from captured CLI text to structured
//! records. The client's output formats are loosely structured and drift
//! between versions, so the parsers are deliberately forgiving: a line that
//! cannot be classified is skipped and surfaced as a warning, never as an
//! error that would abort a reconciliation pass.

pub mod entry;
pub mod info;
pub mod ops;
pub mod parser;

pub use entry::{FileStatusEntry, LockDisposition, StatusKind};
pub use info::{CommitInfo, RepoInfo};
pub use ops::{LockGranted, LockRefused};
pub use parser::{ParseOutcome, RemoteStatus};
