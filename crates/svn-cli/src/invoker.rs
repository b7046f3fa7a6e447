//! The CliInvoker trait and its process-backed implementation

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{Error, Result};

/// Captured output of one svn invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CliOutput {
    /// Convenience constructor for a successful invocation.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    /// Convenience constructor for a failed invocation.
    pub fn err(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability to run the svn binary.
///
/// Injected into the core so that tests can script command output without a
/// real client installed. Implementations must be cheap to share.
#[async_trait]
pub trait CliInvoker: Send + Sync {
    /// Run svn with `args` inside `working_dir` and capture its output.
    ///
    /// Returns `Err` only for transport failures (binary missing, spawn
    /// error). A non-zero exit code is returned as part of the output.
    async fn execute(&self, working_dir: &Path, args: &[String]) -> Result<CliOutput>;
}

/// Authentication passed on every command line.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// [`CliInvoker`] backed by a real svn process.
#[derive(Debug, Clone)]
pub struct SvnProcess {
    binary: String,
    credentials: Option<Credentials>,
}

impl Default for SvnProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl SvnProcess {
    pub fn new() -> Self {
        Self {
            binary: "svn".to_string(),
            credentials: None,
        }
    }

    /// Use a specific binary path instead of resolving `svn` from PATH.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Flags prepended to every invocation.
    ///
    /// `--non-interactive` keeps the client from blocking on a prompt the
    /// editor can never answer; `--no-auth-cache` keeps injected credentials
    /// out of the on-disk auth store.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec![
            "--non-interactive".to_string(),
            "--no-auth-cache".to_string(),
        ];
        if let Some(credentials) = &self.credentials {
            args.push("--username".to_string());
            args.push(credentials.username.clone());
            args.push("--password".to_string());
            args.push(credentials.password.clone());
        }
        args
    }
}

#[async_trait]
impl CliInvoker for SvnProcess {
    async fn execute(&self, working_dir: &Path, args: &[String]) -> Result<CliOutput> {
        tracing::debug!(binary = %self.binary, ?working_dir, ?args, "Invoking svn");

        let output = Command::new(&self.binary)
            .args(self.global_args())
            .args(args)
            .current_dir(working_dir)
            // Pin the locale so status/info output stays parseable.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        let result = CliOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            // A missing code means the process died to a signal; fold it into
            // the generic failure value.
            exit_code: output.status.code().unwrap_or(-1),
        };

        if !result.success() {
            tracing::debug!(
                exit_code = result.exit_code,
                stderr = %result.stderr.trim(),
                "svn exited non-zero"
            );
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_tracks_exit_code() {
        assert!(CliOutput::ok("out").success());
        assert!(!CliOutput::err(1, "boom").success());
    }

    #[test]
    fn global_args_without_credentials() {
        let process = SvnProcess::new();
        assert_eq!(
            process.global_args(),
            vec!["--non-interactive", "--no-auth-cache"]
        );
    }

    #[test]
    fn global_args_with_credentials() {
        let process = SvnProcess::new().with_credentials(Credentials {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        });
        let args = process.global_args();
        assert!(args.contains(&"--username".to_string()));
        assert!(args.contains(&"alice".to_string()));
        assert!(args.contains(&"--password".to_string()));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let process = SvnProcess::new().with_binary("definitely-not-svn-an83k");
        let result = process
            .execute(Path::new("."), &["--version".to_string()])
            .await;
        assert!(matches!(result, Err(Error::Spawn { .. })));
    }
}
