// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RawRunSection, RunSection};
use crate::errors::{ProcguardError, Result};
use crate::output::SinkSpec;
use crate::types::{StdioMode, parse_duration};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ProcguardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let run = validate_run_section(raw.run)?;
        Ok(ConfigFile::new_unchecked(run))
    }
}

fn validate_run_section(raw: RawRunSection) -> Result<RunSection> {
    let defaults = RunSection::default();

    if let Some(name) = &raw.name {
        if name.trim().is_empty() {
            return Err(ProcguardError::ConfigError(
                "[run].name must not be empty".to_string(),
            ));
        }
    }

    if let Some(cwd) = &raw.cwd {
        if cwd.as_os_str().is_empty() {
            return Err(ProcguardError::ConfigError(
                "[run].cwd must not be empty".to_string(),
            ));
        }
    }

    let stdin = raw.stdin.unwrap_or(defaults.stdin);
    if stdin == StdioMode::Piped {
        return Err(ProcguardError::ConfigError(
            "[run].stdin cannot be \"piped\"; nothing would write to it (use \"null\" or \"inherit\")"
                .to_string(),
        ));
    }

    validate_env(&raw)?;

    let grace_period = match &raw.grace_period {
        Some(s) => parse_duration(s)
            .map_err(|e| ProcguardError::ConfigError(format!("[run].grace_period: {e}")))?,
        None => defaults.grace_period,
    };

    let stdout = parse_sink(raw.stdout.as_deref(), defaults.stdout)?;
    let stderr = parse_sink(raw.stderr.as_deref(), defaults.stderr)?;

    Ok(RunSection {
        name: raw.name,
        cwd: raw.cwd,
        stream_output: raw.stream_output.unwrap_or(defaults.stream_output),
        stdout,
        stderr,
        stdin,
        grace_period,
        env: raw.env,
    })
}

fn validate_env(raw: &RawRunSection) -> Result<()> {
    for key in raw.env.keys() {
        if key.is_empty() || key.contains('=') || key.contains('\0') {
            return Err(ProcguardError::ConfigError(format!(
                "[run.env] has invalid variable name '{key}'"
            )));
        }
    }
    Ok(())
}

fn parse_sink(value: Option<&str>, default: SinkSpec) -> Result<SinkSpec> {
    match value {
        Some(s) => s.parse(),
        None => Ok(default),
    }
}
