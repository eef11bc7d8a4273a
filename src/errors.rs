// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::OutputChannel;

#[derive(Error, Debug)]
pub enum ProcguardError {
    /// The caller passed something that is not a usable command token list.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported sink type: {0}")]
    UnsupportedSinkType(String),

    #[error("Failed to spawn process '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Output relay for {channel} failed: {source}")]
    RelayFailed {
        channel: OutputChannel,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink for {0} was closed before the stream ended")]
    SinkClosed(OutputChannel),

    #[error("Signal delivery failed: {0}")]
    SignalError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ProcguardError>;
