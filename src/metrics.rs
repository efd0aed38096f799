//! Per-run counters for the reader and the worker pool.
//!
//! Потокобезопасные атомарные счётчики одного прогона (не глобальные):
//! - reader: прочитанные блоки/байты, отданные chunk'и
//! - pool: обработанные chunk'и, строки, пустые строки, вставки в фильтр

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct Counters {
    // ----- reader -----
    blocks_read: AtomicU64,
    bytes_read: AtomicU64,
    chunks_emitted: AtomicU64,

    // ----- pool -----
    chunks_processed: AtomicU64,
    lines_scanned: AtomicU64,
    empty_lines: AtomicU64,
    keys_inserted: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub blocks_read: u64,
    pub bytes_read: u64,
    pub chunks_emitted: u64,

    pub chunks_processed: u64,
    pub lines_scanned: u64,
    pub empty_lines: u64,
    pub keys_inserted: u64,
}

impl MetricsSnapshot {
    /// Share of non-empty lines that were already (probably) present.
    pub fn duplicate_ratio(&self) -> f64 {
        let keys = self.lines_scanned.saturating_sub(self.empty_lines);
        if keys == 0 {
            0.0
        } else {
            keys.saturating_sub(self.keys_inserted) as f64 / keys as f64
        }
    }
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Recorders (reader) -----
    pub fn record_block(&self, bytes: usize) {
        self.blocks_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn record_chunk_emitted(&self) {
        self.chunks_emitted.fetch_add(1, Ordering::Relaxed);
    }

    // ----- Recorders (pool) -----
    pub fn record_chunk_processed(&self, lines: u64, empty: u64, inserted: u64) {
        self.chunks_processed.fetch_add(1, Ordering::Relaxed);
        self.lines_scanned.fetch_add(lines, Ordering::Relaxed);
        self.empty_lines.fetch_add(empty, Ordering::Relaxed);
        self.keys_inserted.fetch_add(inserted, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_read: self.blocks_read.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            chunks_emitted: self.chunks_emitted.load(Ordering::Relaxed),

            chunks_processed: self.chunks_processed.load(Ordering::Relaxed),
            lines_scanned: self.lines_scanned.load(Ordering::Relaxed),
            empty_lines: self.empty_lines.load(Ordering::Relaxed),
            keys_inserted: self.keys_inserted.load(Ordering::Relaxed),
        }
    }
}
