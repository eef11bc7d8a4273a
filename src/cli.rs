// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `procguard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procguard",
    version,
    about = "Run a command as a supervised child process.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Procguard.toml` in the current working directory, if it
    /// exists. Built-in defaults are used otherwise.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCGUARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Name shown in "Stopping <name>..." / "Killing <name>..." messages.
    ///
    /// Defaults to the program name.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Where to relay the child's stdout (stdout, stderr, discard, file:<path>).
    #[arg(long, value_name = "SINK")]
    pub stdout: Option<String>,

    /// Where to relay the child's stderr (stdout, stderr, discard, file:<path>).
    #[arg(long, value_name = "SINK")]
    pub stderr: Option<String>,

    /// Do not relay output at all; the child's stdout/stderr go to null.
    #[arg(long)]
    pub quiet: bool,

    /// The child's stdin: `null` (default) or `inherit`.
    #[arg(long, value_name = "MODE")]
    pub stdin: Option<String>,

    /// Working directory for the child.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<String>,

    /// Extra environment variable for the child. Repeatable.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Time to wait after the graceful signal before force-killing on cleanup.
    #[arg(long, value_name = "DURATION")]
    pub grace_period: Option<String>,

    /// Resolve and print the settings, but don't start the command.
    #[arg(long)]
    pub dry_run: bool,

    /// The command to run: program followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
