// src/exec/options.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::StdioMode;

/// Default time a released child gets between the graceful signal and a
/// forced kill.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How a child process is spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnOptions {
    pub stdin: StdioMode,
    pub stdout: StdioMode,
    pub stderr: StdioMode,
    pub cwd: Option<PathBuf>,
    /// Added on top of the parent's environment.
    pub env: BTreeMap<String, String>,
    /// How long release waits for exit after the graceful signal.
    pub grace_period: Duration,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            stdin: StdioMode::Null,
            stdout: StdioMode::Inherit,
            stderr: StdioMode::Inherit,
            cwd: None,
            env: BTreeMap::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdin(mut self, mode: StdioMode) -> Self {
        self.stdin = mode;
        self
    }

    pub fn stdout(mut self, mode: StdioMode) -> Self {
        self.stdout = mode;
        self
    }

    pub fn stderr(mut self, mode: StdioMode) -> Self {
        self.stderr = mode;
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }
}
