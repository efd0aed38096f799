//! Orchestrator: reader -> bounded queue -> worker pool -> approximate count.
//!
//! Порядок:
//! 1) validate config, build filter (ошибки параметров: до старта потоков);
//! 2) start pool;
//! 3) ChunkReader отдаёт line-aligned chunk'и, pool.add() блокирует при полной очереди;
//! 4) finish(): stop каждому воркеру, drain, join;
//! 5) filter.count().
//!
//! Любая ошибка чтения прерывает подсчёт: пул всё равно останавливается (Drop),
//! частичный результат не возвращается.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;

use crate::bloom::{expected_fp_rate, BloomFilter, KeySet};
use crate::config::CountConfig;
use crate::error::CountError;
use crate::metrics::{Counters, MetricsSnapshot};
use crate::pool::WorkerPool;
use crate::reader::ChunkReader;

/// Result of one counting run.
#[derive(Debug, Clone, Serialize)]
pub struct CountReport {
    /// Approximate number of distinct non-empty lines.
    pub approx_distinct: u64,
    /// Filter size in bits (m).
    pub bits: u64,
    /// Hash functions (k).
    pub hashes: u64,
    pub filter_bytes: usize,
    pub fill_ratio: f64,
    /// Theoretical false-positive rate at the final load.
    pub expected_fp_rate: f64,
    pub elapsed_ms: u64,
    pub metrics: MetricsSnapshot,
}

/// Count distinct lines of `source` under `cfg`.
pub fn count_distinct<R: Read>(source: R, cfg: &CountConfig) -> Result<CountReport> {
    cfg.validate().context("invalid count configuration")?;
    let started = Instant::now();

    let filter = Arc::new(
        BloomFilter::with_kind(cfg.expected_elements, cfg.fp_rate, cfg.hash_kind)
            .context("build bloom filter")?,
    );
    debug!(
        "bloom: n={} p={} -> m={} bits ({} B), k={}",
        cfg.expected_elements,
        cfg.fp_rate,
        filter.bits(),
        filter.byte_len(),
        filter.hashes()
    );

    let counters = Arc::new(Counters::new());
    let keys: Arc<dyn KeySet> = filter.clone();
    let mut pool =
        WorkerPool::new(cfg.workers, cfg.queue_capacity, keys)?.with_counters(Arc::clone(&counters));
    pool.start().context("start worker pool")?;

    let reader = ChunkReader::new(source, cfg.block_size)?.with_counters(Arc::clone(&counters));
    for chunk in reader {
        let chunk = chunk.map_err(CountError::Io).context("read source")?;
        if let Err(e) = pool.add(chunk) {
            // Очередь закрылась раньше времени: причина (паника воркера) важнее.
            pool.finish()?;
            return Err(e.into());
        }
    }

    pool.finish().context("finish worker pool")?;

    let approx = filter.count();
    let elapsed = started.elapsed();
    let report = CountReport {
        approx_distinct: approx,
        bits: filter.bits(),
        hashes: filter.hashes(),
        filter_bytes: filter.byte_len(),
        fill_ratio: filter.fill_ratio(),
        expected_fp_rate: expected_fp_rate(filter.bits(), filter.hashes(), approx),
        elapsed_ms: elapsed.as_millis().min(u64::MAX as u128) as u64,
        metrics: counters.snapshot(),
    };
    info!(
        "counted ~{} distinct keys in {:.2?} ({} B read)",
        report.approx_distinct, elapsed, report.metrics.bytes_read
    );
    if approx > cfg.expected_elements {
        warn!(
            "distinct keys ({}) exceed expected_elements ({}): false-positive rate is above target",
            approx, cfg.expected_elements
        );
    }
    Ok(report)
}

/// Count distinct lines of a file; `-` reads stdin.
pub fn count_distinct_path(path: &Path, cfg: &CountConfig) -> Result<CountReport> {
    info!("counting distinct lines of {} with {}", path.display(), cfg);
    if path.as_os_str() == "-" {
        let stdin = std::io::stdin();
        return count_distinct(stdin.lock(), cfg);
    }
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    count_distinct(f, cfg).with_context(|| format!("count {}", path.display()))
}
