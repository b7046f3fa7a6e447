//! Scripted CliInvoker double
//!
//! Tests script output per subcommand instead of shelling out to a real svn
//! client. One-shot responses are consumed in order; a per-subcommand default
//! answers once the queue is empty. Every call is recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use svn_cli::{CliInvoker, CliOutput, Result};

#[derive(Default)]
struct Script {
    queued: HashMap<String, VecDeque<CliOutput>>,
    defaults: HashMap<String, CliOutput>,
    delays: HashMap<String, Duration>,
    calls: Vec<(PathBuf, Vec<String>)>,
}

/// A [`CliInvoker`] whose answers come from the test instead of a process.
#[derive(Default)]
pub struct ScriptedInvoker {
    script: Mutex<Script>,
}

impl ScriptedInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot response for a subcommand.
    pub fn with_response(self, subcommand: &str, output: CliOutput) -> Self {
        self.push_response(subcommand, output);
        self
    }

    /// Set the fallback response for a subcommand.
    pub fn with_default(self, subcommand: &str, output: CliOutput) -> Self {
        self.script
            .lock()
            .unwrap()
            .defaults
            .insert(subcommand.to_string(), output);
        self
    }

    /// Delay every response for a subcommand, for in-flight overlap tests.
    pub fn with_delay(self, subcommand: &str, delay: Duration) -> Self {
        self.script
            .lock()
            .unwrap()
            .delays
            .insert(subcommand.to_string(), delay);
        self
    }

    /// Queue a one-shot response served before any already-queued ones.
    pub fn with_response_front(self, subcommand: &str, output: CliOutput) -> Self {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(subcommand.to_string())
            .or_default()
            .push_front(output);
        self
    }

    /// Queue a one-shot response after construction.
    pub fn push_response(&self, subcommand: &str, output: CliOutput) {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(subcommand.to_string())
            .or_default()
            .push_back(output);
    }

    /// Replace the fallback response after construction.
    pub fn set_default(&self, subcommand: &str, output: CliOutput) {
        self.script
            .lock()
            .unwrap()
            .defaults
            .insert(subcommand.to_string(), output);
    }

    /// Every recorded invocation, as (working dir, argv).
    pub fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Number of invocations whose first argument was `subcommand`.
    pub fn calls_for(&self, subcommand: &str) -> usize {
        self.script
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, args)| args.first().map(String::as_str) == Some(subcommand))
            .count()
    }
}

#[async_trait]
impl CliInvoker for ScriptedInvoker {
    async fn execute(&self, working_dir: &Path, args: &[String]) -> Result<CliOutput> {
        let subcommand = args.first().cloned().unwrap_or_default();

        let (output, delay) = {
            let mut script = self.script.lock().unwrap();
            script
                .calls
                .push((working_dir.to_path_buf(), args.to_vec()));

            let output = script
                .queued
                .get_mut(&subcommand)
                .and_then(VecDeque::pop_front)
                .or_else(|| script.defaults.get(&subcommand).cloned())
                .unwrap_or_else(|| CliOutput::ok(""));
            (output, script.delays.get(&subcommand).copied())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        Ok(output)
    }
}
