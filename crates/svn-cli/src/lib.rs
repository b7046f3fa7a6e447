//! Subprocess invocation layer for the svn client binary
//!
//! Higher layers describe *what* command line to run; this crate owns *how* it
//! is spawned: working directory, locale, interactivity and authentication
//! flags. A failure to spawn at all (binary missing, permission denied) is a
//! transport error and is the only error this crate produces. A non-zero exit
//! code is ordinary data in [`CliOutput`] for callers to interpret.

pub mod error;
pub mod invoker;

pub use error::{Error, Result};
pub use invoker::{CliInvoker, CliOutput, Credentials, SvnProcess};
