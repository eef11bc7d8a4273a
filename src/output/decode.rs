// src/output/decode.rs

//! Raw byte channel → UTF-8 text chunks.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

/// Maximum number of bytes read from a pipe per chunk.
pub const MAX_CHUNK_BYTES: usize = 65536;

/// Incremental UTF-8 decoder.
///
/// Bytes are fed in arbitrary pieces. A multi-byte sequence cut by a piece
/// boundary is held back until the rest arrives; invalid bytes are replaced
/// with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + bytes` as possible.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut pos = 0;

        while pos < self.pending.len() {
            match std::str::from_utf8(&self.pending[pos..]) {
                Ok(s) => {
                    out.push_str(s);
                    pos = self.pending.len();
                }
                Err(e) => {
                    let valid = pos + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[pos..valid]));
                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            pos = valid + len;
                        }
                        None => {
                            // Incomplete sequence at the end; wait for more.
                            pos = valid;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..pos);
        out
    }

    /// Flush whatever is still held back. Call once, at end of input.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(tail)
    }
}

/// A lazy, one-pass sequence of text chunks read from `R`.
///
/// Once [`next_chunk`](Self::next_chunk) has returned `Ok(None)` the source
/// is exhausted and every further call returns `Ok(None)` again.
#[derive(Debug)]
pub struct TextChunks<R> {
    reader: R,
    buf: Vec<u8>,
    decoder: Utf8ChunkDecoder,
    done: bool,
}

impl<R: AsyncRead + Unpin> TextChunks<R> {
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, MAX_CHUNK_BYTES)
    }

    pub fn with_capacity(reader: R, max_chunk_bytes: usize) -> Self {
        Self {
            reader,
            buf: vec![0; max_chunk_bytes.max(1)],
            decoder: Utf8ChunkDecoder::new(),
            done: false,
        }
    }

    /// Read the next non-empty chunk of text.
    pub async fn next_chunk(&mut self) -> io::Result<Option<String>> {
        while !self.done {
            let n = self.reader.read(&mut self.buf).await?;
            if n == 0 {
                self.done = true;
                return Ok(self.decoder.finish());
            }

            let text = self.decoder.decode(&self.buf[..n]);
            if !text.is_empty() {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }
}
