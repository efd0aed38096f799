//! Seeded 64-bit hash families for the Bloom filter.
//!
//! Goals:
//! - Keep the filter independent of the concrete algorithm: it only sees
//!   `HashFamily` / `Hash64`.
//! - Reproducible seeding: instance `i` of a family is always seeded with `i`,
//!   so the same k yields the same bit positions across runs and platforms.
//!
//! The k seeded instances are assumed to behave as independent uniform hash
//! functions. Nothing checks this at runtime.

use std::fmt;
use std::hash::Hasher;
use std::io;
use std::str::FromStr;

use twox_hash::XxHash64;

/// One reusable hash-function instance: reset, feed bytes, read the digest.
pub trait Hash64: Send {
    /// Return to the freshly-seeded state.
    fn reset(&mut self);

    /// Consume `data`. Returns the number of bytes consumed.
    /// Hashing into memory never fails in practice; callers treat an error or
    /// a short write as a broken invariant.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// 64-bit digest of everything written since the last reset.
    fn sum64(&self) -> u64;
}

/// Produces k independently seeded instances (seeds 0..k-1).
pub trait HashFamily: Send + Sync {
    fn get_hashes(&self, k: u64) -> Vec<Box<dyn Hash64>>;
}

/// Concrete family selector (config/CLI).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// 64-bit xxhash, seed = instance index.
    Xx64,
}

impl HashKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HashKind::Xx64 => "xx64",
        }
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashKind::Xx64 => write!(f, "xxhash64(seed=index)"),
        }
    }
}

impl FromStr for HashKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xx64" | "xxhash64" | "xxh64" => Ok(HashKind::Xx64),
            other => Err(format!("unknown hash kind '{}' (expected: xx64)", other)),
        }
    }
}

/// Default family for new filters.
pub const HASH_KIND_DEFAULT: HashKind = HashKind::Xx64;

/// Build the family for the given kind.
pub fn hash_family(kind: HashKind) -> Box<dyn HashFamily> {
    match kind {
        HashKind::Xx64 => Box::new(XxHashFamily),
    }
}

/// XxHash64 family: instance i is `XxHash64::with_seed(i)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XxHashFamily;

impl HashFamily for XxHashFamily {
    fn get_hashes(&self, k: u64) -> Vec<Box<dyn Hash64>> {
        (0..k)
            .map(|i| Box::new(SeededXx64::new(i)) as Box<dyn Hash64>)
            .collect()
    }
}

/// XxHash64 with a remembered seed so it can be reset in place.
#[derive(Clone)]
pub struct SeededXx64 {
    seed: u64,
    inner: XxHash64,
}

impl SeededXx64 {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: XxHash64::with_seed(seed),
        }
    }
}

impl Hash64 for SeededXx64 {
    #[inline]
    fn reset(&mut self) {
        self.inner = XxHash64::with_seed(self.seed);
    }

    #[inline]
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        Hasher::write(&mut self.inner, data);
        Ok(data.len())
    }

    #[inline]
    fn sum64(&self) -> u64 {
        self.inner.finish()
    }
}
