// src/output/sink.rs

//! Destinations for relayed output.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use crate::errors::{ProcguardError, Result};

/// Where the text chunks of one output channel go.
pub enum Sink {
    /// Consume and drop every chunk.
    Discard,
    /// Async file or stream; each chunk is written and flushed.
    Writer(Box<dyn AsyncWrite + Send + Unpin>),
    /// Blocking file or stream; each chunk is written and flushed on the
    /// blocking thread pool.
    Blocking(Box<dyn std::io::Write + Send>),
    /// Stream abstraction: each chunk is sent as one message.
    Channel(mpsc::Sender<String>),
}

impl Sink {
    /// The parent's own stdout.
    pub fn stdout() -> Self {
        Sink::Writer(Box::new(tokio::io::stdout()))
    }

    /// The parent's own stderr.
    pub fn stderr() -> Self {
        Sink::Writer(Box::new(tokio::io::stderr()))
    }

    pub fn writer(w: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Sink::Writer(Box::new(w))
    }

    pub fn blocking(w: impl std::io::Write + Send + 'static) -> Self {
        Sink::Blocking(Box::new(w))
    }

    pub fn channel(tx: mpsc::Sender<String>) -> Self {
        Sink::Channel(tx)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Sink::Discard => "discard",
            Sink::Writer(_) => "writer",
            Sink::Blocking(_) => "blocking",
            Sink::Channel(_) => "channel",
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sink").field(&self.kind()).finish()
    }
}

impl From<tokio::fs::File> for Sink {
    fn from(file: tokio::fs::File) -> Self {
        Sink::Writer(Box::new(file))
    }
}

impl From<std::fs::File> for Sink {
    fn from(file: std::fs::File) -> Self {
        Sink::Blocking(Box::new(file))
    }
}

impl From<mpsc::Sender<String>> for Sink {
    fn from(tx: mpsc::Sender<String>) -> Self {
        Sink::Channel(tx)
    }
}

/// Textual description of a sink, as used in the config file and on the
/// command line.
///
/// - `stdout` / `stderr`: the parent's own streams
/// - `discard` (or `null`): drop everything
/// - `file:<path>`: append to a file, created if missing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSpec {
    Stdout,
    Stderr,
    Discard,
    File(PathBuf),
}

impl SinkSpec {
    /// Open the sink this spec describes.
    pub async fn open(&self) -> Result<Sink> {
        match self {
            SinkSpec::Stdout => Ok(Sink::stdout()),
            SinkSpec::Stderr => Ok(Sink::stderr()),
            SinkSpec::Discard => Ok(Sink::Discard),
            SinkSpec::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
                let file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                Ok(Sink::from(file))
            }
        }
    }
}

impl FromStr for SinkSpec {
    type Err = ProcguardError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(path) = s.strip_prefix("file:") {
            if path.is_empty() {
                return Err(ProcguardError::UnsupportedSinkType(
                    "file sink needs a path (file:<path>)".to_string(),
                ));
            }
            return Ok(SinkSpec::File(PathBuf::from(path)));
        }

        match s.to_lowercase().as_str() {
            "stdout" => Ok(SinkSpec::Stdout),
            "stderr" => Ok(SinkSpec::Stderr),
            "discard" | "null" => Ok(SinkSpec::Discard),
            other => Err(ProcguardError::UnsupportedSinkType(format!(
                "'{other}' (expected stdout, stderr, discard or file:<path>)"
            ))),
        }
    }
}

impl fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkSpec::Stdout => f.write_str("stdout"),
            SinkSpec::Stderr => f.write_str("stderr"),
            SinkSpec::Discard => f.write_str("discard"),
            SinkSpec::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}
