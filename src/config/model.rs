// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::exec::DEFAULT_GRACE_PERIOD;
use crate::output::SinkSpec;
use crate::types::StdioMode;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// name = "worker"
/// cwd = "."
/// stream_output = true
/// stdout = "stdout"
/// stderr = "file:logs/worker.err"
/// grace_period = "5s"
///
/// [run.env]
/// RUST_LOG = "info"
/// ```
///
/// All sections and keys are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RawRunSection,
}

/// `[run]` section, as written.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRunSection {
    /// Name used in interrupt messages; defaults to the program name.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Relay output at all (default `true`).
    #[serde(default)]
    pub stream_output: Option<bool>,

    /// Sink description for stdout (default `"stdout"`).
    #[serde(default)]
    pub stdout: Option<String>,

    /// Sink description for stderr (default `"stderr"`).
    #[serde(default)]
    pub stderr: Option<String>,

    /// `"null"` (default) or `"inherit"`.
    #[serde(default)]
    pub stdin: Option<StdioMode>,

    /// e.g. `"500ms"`, `"5s"`.
    #[serde(default)]
    pub grace_period: Option<String>,

    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` or
/// [`ConfigFile::default`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigFile {
    pub run: RunSection,
}

/// Validated `[run]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSection {
    pub name: Option<String>,
    pub cwd: Option<PathBuf>,
    pub stream_output: bool,
    pub stdout: SinkSpec,
    pub stderr: SinkSpec,
    pub stdin: StdioMode,
    pub grace_period: Duration,
    pub env: BTreeMap<String, String>,
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            name: None,
            cwd: None,
            stream_output: true,
            stdout: SinkSpec::Stdout,
            stderr: SinkSpec::Stderr,
            stdin: StdioMode::Null,
            grace_period: DEFAULT_GRACE_PERIOD,
            env: BTreeMap::new(),
        }
    }
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection) -> Self {
        Self { run }
    }
}
