//! Error types for svn-core

use std::path::PathBuf;

/// Result type for svn-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in svn-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Expected negative probe result: the path is not inside a working copy.
    #[error("not a working copy: {path}")]
    NotWorkingCopy { path: PathBuf },

    /// The svn binary could not be invoked at all. More severe than a
    /// non-zero exit and never retried here.
    #[error(transparent)]
    Transport(#[from] svn_cli::Error),

    /// The binary ran and reported failure for the operation as a whole.
    #[error("svn {operation} failed (exit {exit_code}): {stderr}")]
    Operation {
        operation: String,
        exit_code: i32,
        stderr: String,
    },

    /// A branch reference outside the trunk/branches/tags layout.
    #[error("unknown branch reference: {reference}")]
    UnknownBranchRef { reference: String },

    /// The repository was disposed; no further operations run.
    #[error("repository has been disposed")]
    Disposed,
}
