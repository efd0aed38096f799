//! ChunkReader: streaming split of a byte source into line-aligned chunks.
//!
//! Алгоритм:
//! - читаем физический блок до S байт;
//! - ищем последний '\n' в блоке (с конца);
//! - residual (хвост прошлого блока) + префикс блока до '\n' включительно = один chunk;
//! - остаток (неполная строка, либо весь блок если '\n' нет) становится новым residual;
//! - на EOF непустой residual отдаётся последним chunk'ом, даже без терминатора.
//!
//! Каждая строка источника попадает ровно в один chunk, независимо от S.

use std::io::{self, Read};
use std::mem;
use std::sync::Arc;

use crate::error::{CountError, Result};
use crate::metrics::Counters;

pub const LINE_TERMINATOR: u8 = b'\n';

/// Line-aligned byte range. Ends at `\n` except possibly the last chunk of a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    data: Vec<u8>,
}

impl Chunk {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Lines of the chunk without terminators. A trailing `\r` is dropped, so
    /// CRLF input yields the same keys as LF input. Empty lines are yielded.
    pub fn lines(&self) -> Lines<'_> {
        Lines { rest: &self.data }
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(data: Vec<u8>) -> Self {
        Chunk::new(data)
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Chunk::new(s.as_bytes().to_vec())
    }
}

pub struct Lines<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let rest: &'a [u8] = self.rest;
        if rest.is_empty() {
            return None;
        }
        let line = match rest.iter().position(|&b| b == LINE_TERMINATOR) {
            Some(pos) => {
                self.rest = &rest[pos + 1..];
                &rest[..pos]
            }
            None => {
                self.rest = &[];
                rest
            }
        };
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }
}

/// Reads `src` in blocks of `block_size` bytes and yields line-aligned chunks.
pub struct ChunkReader<R> {
    src: R,
    block_size: usize,
    residual: Vec<u8>,
    done: bool,
    counters: Option<Arc<Counters>>,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(src: R, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(CountError::invalid("block size must be greater than zero"));
        }
        Ok(Self {
            src,
            block_size,
            residual: Vec::new(),
            done: false,
            counters: None,
        })
    }

    /// Record blocks/bytes/chunks into `counters`.
    pub fn with_counters(mut self, counters: Arc<Counters>) -> Self {
        self.counters = Some(counters);
        self
    }

    /// Next chunk, `Ok(None)` at end of source. After an error the reader is
    /// finished and keeps returning `Ok(None)`.
    pub fn next_chunk(&mut self) -> io::Result<Option<Chunk>> {
        while !self.done {
            let mut buf = vec![0u8; self.block_size];
            let n = match self.src.read(&mut buf) {
                Ok(n) => n,
                // EINTR is not a failed read.
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    self.residual = Vec::new();
                    return Err(e);
                }
            };

            if n == 0 {
                self.done = true;
                if self.residual.is_empty() {
                    return Ok(None);
                }
                let tail = mem::take(&mut self.residual);
                return Ok(Some(self.emit(tail)));
            }

            buf.truncate(n);
            if let Some(c) = &self.counters {
                c.record_block(n);
            }

            match buf.iter().rposition(|&b| b == LINE_TERMINATOR) {
                Some(pos) => {
                    let tail = buf.split_off(pos + 1);
                    let data = if self.residual.is_empty() {
                        buf
                    } else {
                        let mut data = mem::take(&mut self.residual);
                        data.extend_from_slice(&buf);
                        data
                    };
                    self.residual = tail;
                    return Ok(Some(self.emit(data)));
                }
                // Целый блок без '\n': копим дальше.
                None => self.residual.extend_from_slice(&buf),
            }
        }
        Ok(None)
    }

    fn emit(&self, data: Vec<u8>) -> Chunk {
        if let Some(c) = &self.counters {
            c.record_chunk_emitted();
        }
        Chunk::new(data)
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_chunk().transpose()
    }
}
