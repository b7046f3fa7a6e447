//! Error types for svn-cli

/// Result type for svn-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when invoking the svn binary
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The binary could not be started at all. Distinct from a non-zero exit
    /// code, which is reported through [`crate::CliOutput`].
    #[error("could not start '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}
