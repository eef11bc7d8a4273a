// src/output/mod.rs

//! Output streaming for child processes.
//!
//! - [`decode`] turns a raw pipe into a lazy sequence of UTF-8 text chunks.
//! - [`sink`] defines where chunks go ([`Sink`]) and the textual form used in
//!   config and on the CLI ([`SinkSpec`]).
//! - [`relay`] forwards one channel's chunks to one sink.
//! - [`fanout`] runs the stdout and stderr relays of a process together.

pub mod decode;
pub mod fanout;
pub mod relay;
pub mod sink;

pub use decode::{TextChunks, Utf8ChunkDecoder};
pub use fanout::consume_process_output;
pub use relay::{RelayStats, relay};
pub use sink::{Sink, SinkSpec};
