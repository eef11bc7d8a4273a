// src/exec/command.rs

//! Command token vectors.
//!
//! Callers hand a [`CommandSpec`] to the runtime; only the `Tokens` form is
//! ever launched. A single command *string* is rejected up front: launching
//! one would mean handing it to a shell, and the runtime never does shell
//! interpretation on behalf of a caller.

use std::fmt;

use crate::errors::{ProcguardError, Result};

/// A command as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSpec {
    /// Program followed by its arguments.
    Tokens(Vec<String>),
    /// A single concatenated command line. Always rejected.
    Line(String),
}

impl From<Vec<String>> for CommandSpec {
    fn from(tokens: Vec<String>) -> Self {
        CommandSpec::Tokens(tokens)
    }
}

impl From<Vec<&str>> for CommandSpec {
    fn from(tokens: Vec<&str>) -> Self {
        CommandSpec::Tokens(tokens.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for CommandSpec {
    fn from(tokens: &[&str]) -> Self {
        CommandSpec::Tokens(tokens.iter().map(|s| s.to_string()).collect())
    }
}

impl From<&[String]> for CommandSpec {
    fn from(tokens: &[String]) -> Self {
        CommandSpec::Tokens(tokens.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for CommandSpec {
    fn from(tokens: [&str; N]) -> Self {
        CommandSpec::Tokens(tokens.iter().map(|s| s.to_string()).collect())
    }
}

impl From<String> for CommandSpec {
    fn from(line: String) -> Self {
        CommandSpec::Line(line)
    }
}

impl From<&str> for CommandSpec {
    fn from(line: &str) -> Self {
        CommandSpec::Line(line.to_string())
    }
}

impl From<ProcessCommand> for CommandSpec {
    fn from(cmd: ProcessCommand) -> Self {
        CommandSpec::Tokens(cmd.tokens)
    }
}

impl From<&ProcessCommand> for CommandSpec {
    fn from(cmd: &ProcessCommand) -> Self {
        CommandSpec::Tokens(cmd.tokens.clone())
    }
}

/// A validated command: a non-empty list of tokens whose first element is
/// the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    tokens: Vec<String>,
}

impl ProcessCommand {
    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Space-joined form, used only where the platform's process creation
    /// takes a single command line.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

impl TryFrom<CommandSpec> for ProcessCommand {
    type Error = ProcguardError;

    fn try_from(spec: CommandSpec) -> std::result::Result<Self, Self::Error> {
        match spec {
            CommandSpec::Line(line) => Err(ProcguardError::InvalidArgument(format!(
                "the command passed to open a process must be a list of tokens; \
                 you passed the string '{line}'"
            ))),
            CommandSpec::Tokens(tokens) => {
                match tokens.first() {
                    None => Err(ProcguardError::InvalidArgument(
                        "the command must contain at least one token (the program)".to_string(),
                    )),
                    Some(program) if program.trim().is_empty() => {
                        Err(ProcguardError::InvalidArgument(
                            "the program token of a command must not be empty".to_string(),
                        ))
                    }
                    Some(_) => Ok(ProcessCommand { tokens }),
                }
            }
        }
    }
}

impl ProcessCommand {
    /// Validate anything convertible into a [`CommandSpec`].
    pub fn parse(spec: impl Into<CommandSpec>) -> Result<Self> {
        Self::try_from(spec.into())
    }
}

impl fmt::Display for ProcessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}
