//! Centralized configuration and builder for a counting run.
//!
//! Goals:
//! - One validated value carries every tunable; nothing is read from globals
//!   once the run has started.
//! - CountConfig::from_env() lets ops override defaults without a rebuild.
//! - CountBuilder is the fluent entry point used by the CLI and tests.
//!
//! Memory ceiling of a run is roughly
//!   queue_capacity * block_size   (chunks waiting in the queue)
//! + workers * block_size          (chunks being processed)
//! + m / 8                         (filter bits)
//! and does not depend on the size of the input.

use std::fmt;

use crate::bloom::params::validate_inputs;
use crate::error::{CountError, Result};
use crate::hash::{HashKind, HASH_KIND_DEFAULT};

/// Physical read size, bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024 * 1024;
/// Chunks that may wait in the queue before the reader blocks.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_WORKERS: usize = 11;
/// Expected number of distinct keys. 1<<32 would cover all of IPv4 but needs
/// gigabytes of bits; 1<<16 keeps the default run small.
pub const DEFAULT_EXPECTED_ELEMENTS: u64 = 1 << 16;
pub const DEFAULT_FP_RATE: f64 = 0.001;

#[derive(Clone, Debug, PartialEq)]
pub struct CountConfig {
    /// Bytes per physical read (S).
    /// Env: UQ_BLOCK_SIZE (default 8 MiB)
    pub block_size: usize,

    /// Bounded queue capacity, in chunks.
    /// Env: UQ_QUEUE_CAPACITY (default 10)
    pub queue_capacity: usize,

    /// Worker threads (W).
    /// Env: UQ_WORKERS (default 11)
    pub workers: usize,

    /// Expected distinct keys (N) used to size the filter.
    /// Env: UQ_EXPECTED_ELEMENTS (default 65536)
    pub expected_elements: u64,

    /// Target false-positive rate (p), in (0, 1).
    /// Env: UQ_FP_RATE (default 0.001)
    pub fp_rate: f64,

    /// Hash family.
    /// Env: UQ_HASH = xx64
    pub hash_kind: HashKind,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            workers: DEFAULT_WORKERS,
            expected_elements: DEFAULT_EXPECTED_ELEMENTS,
            fp_rate: DEFAULT_FP_RATE,
            hash_kind: HASH_KIND_DEFAULT,
        }
    }
}

impl CountConfig {
    /// Defaults overridden by UQ_* environment variables.
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(n) = env_parse::<usize>("UQ_BLOCK_SIZE") {
            cfg.block_size = n;
        }
        if let Some(n) = env_parse::<usize>("UQ_QUEUE_CAPACITY") {
            cfg.queue_capacity = n;
        }
        if let Some(n) = env_parse::<usize>("UQ_WORKERS") {
            cfg.workers = n;
        }
        if let Some(n) = env_parse::<u64>("UQ_EXPECTED_ELEMENTS") {
            cfg.expected_elements = n;
        }
        if let Some(p) = env_parse::<f64>("UQ_FP_RATE") {
            cfg.fp_rate = p;
        }
        if let Some(kind) = env_parse::<HashKind>("UQ_HASH") {
            cfg.hash_kind = kind;
        }

        cfg
    }

    /// Reject values the run cannot work with. Called before any thread starts.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(CountError::invalid("block size must be greater than zero"));
        }
        if self.queue_capacity == 0 {
            return Err(CountError::invalid("queue capacity must be greater than zero"));
        }
        if self.workers == 0 {
            return Err(CountError::invalid("worker count must be greater than zero"));
        }
        validate_inputs(self.expected_elements, self.fp_rate)
    }

    pub fn with_block_size(mut self, bytes: usize) -> Self {
        self.block_size = bytes;
        self
    }

    pub fn with_queue_capacity(mut self, chunks: usize) -> Self {
        self.queue_capacity = chunks;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_expected_elements(mut self, n: u64) -> Self {
        self.expected_elements = n;
        self
    }

    pub fn with_fp_rate(mut self, p: f64) -> Self {
        self.fp_rate = p;
        self
    }

    pub fn with_hash_kind(mut self, kind: HashKind) -> Self {
        self.hash_kind = kind;
        self
    }

    /// Upper bound of chunk bytes alive at once (queued + in workers).
    pub fn inflight_bytes_bound(&self) -> usize {
        self.queue_capacity
            .saturating_add(self.workers)
            .saturating_mul(self.block_size)
    }
}

impl fmt::Display for CountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CountConfig {{ \
             block_size: {}, \
             queue_capacity: {}, \
             workers: {}, \
             expected_elements: {}, \
             fp_rate: {}, \
             hash: {} \
             }}",
            self.block_size,
            self.queue_capacity,
            self.workers,
            self.expected_elements,
            self.fp_rate,
            self.hash_kind.as_str(),
        )
    }
}

/// Fluent builder that produces a validated CountConfig.
#[derive(Clone, Debug)]
pub struct CountBuilder {
    cfg: CountConfig,
}

impl Default for CountBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: CountConfig::from_env(),
        }
    }
}

impl CountBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: CountConfig::default(),
        }
    }

    pub fn block_size(mut self, bytes: usize) -> Self {
        self.cfg.block_size = bytes;
        self
    }

    pub fn queue_capacity(mut self, chunks: usize) -> Self {
        self.cfg.queue_capacity = chunks;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.cfg.workers = workers;
        self
    }

    pub fn expected_elements(mut self, n: u64) -> Self {
        self.cfg.expected_elements = n;
        self
    }

    pub fn fp_rate(mut self, p: f64) -> Self {
        self.cfg.fp_rate = p;
        self
    }

    pub fn hash_kind(mut self, kind: HashKind) -> Self {
        self.cfg.hash_kind = kind;
        self
    }

    /// Finish and validate.
    pub fn build(self) -> Result<CountConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse::<T>().ok())
}
