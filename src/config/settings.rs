// src/config/settings.rs

//! Effective run settings: config file values overridden by CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::errors::{ProcguardError, Result};
use crate::exec::{ProcessCommand, SpawnOptions, StreamOutput};
use crate::output::SinkSpec;
use crate::types::{StdioMode, parse_duration};

/// Everything needed to start one supervised run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Name used in interrupt messages.
    pub name: String,
    pub command: ProcessCommand,
    pub stream_output: bool,
    pub stdout: SinkSpec,
    pub stderr: SinkSpec,
    pub options: SpawnOptions,
}

impl RunSettings {
    /// Merge `cfg` with the CLI; CLI values win.
    pub fn resolve(cfg: &ConfigFile, args: &CliArgs) -> Result<Self> {
        let run = &cfg.run;
        let command = ProcessCommand::parse(args.command.clone())?;

        let name = args
            .name
            .clone()
            .or_else(|| run.name.clone())
            .unwrap_or_else(|| program_name(&command));

        let stdout = match &args.stdout {
            Some(s) => s.parse()?,
            None => run.stdout.clone(),
        };
        let stderr = match &args.stderr {
            Some(s) => s.parse()?,
            None => run.stderr.clone(),
        };

        let grace_period: Duration = match &args.grace_period {
            Some(s) => parse_duration(s)
                .map_err(|e| ProcguardError::ConfigError(format!("--grace-period: {e}")))?,
            None => run.grace_period,
        };

        let stdin = match &args.stdin {
            Some(s) => s.parse::<StdioMode>().map_err(ProcguardError::ConfigError)?,
            None => run.stdin,
        };
        if stdin == StdioMode::Piped {
            return Err(ProcguardError::ConfigError(
                "--stdin cannot be \"piped\"; use \"null\" or \"inherit\"".to_string(),
            ));
        }

        let mut options = SpawnOptions::new().stdin(stdin).grace_period(grace_period);
        options.env = run.env.clone();
        for entry in &args.env {
            let (key, value) = parse_env_entry(entry)?;
            options.env.insert(key, value);
        }
        options.cwd = args
            .cwd
            .as_ref()
            .map(PathBuf::from)
            .or_else(|| run.cwd.clone());

        Ok(Self {
            name,
            command,
            stream_output: run.stream_output && !args.quiet,
            stdout,
            stderr,
            options,
        })
    }

    /// Open the configured sinks.
    pub async fn open_stream_output(&self) -> Result<StreamOutput> {
        if !self.stream_output {
            return Ok(StreamOutput::Disabled);
        }
        Ok(StreamOutput::to(
            Some(self.stdout.open().await?),
            Some(self.stderr.open().await?),
        ))
    }
}

fn program_name(command: &ProcessCommand) -> String {
    Path::new(command.program())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| command.program().to_string())
}

fn parse_env_entry(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(ProcguardError::ConfigError(format!(
            "--env expects KEY=VALUE, got '{entry}'"
        ))),
    }
}
