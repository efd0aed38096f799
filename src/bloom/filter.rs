//! BloomFilter: shared membership set for the worker pool.
//!
//! Состояние (биты + k хэш-инстансов) живёт под одним Mutex: каждый add()/test()
//! это одна эксклюзивная критическая секция (k хэшей + k битовых операций).
//! Счётчик принятых ключей: AtomicU64, увеличивается внутри секции, читается без lock.
//!
//! add() всегда увеличивает счётчик и сам членство не проверяет. Приближение числа
//! уникальных ключей получается только при дисциплине "test, затем add" у вызывающего
//! (см. pool::worker).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::bits::BitVector;
use super::params::optimal_params;
use super::KeySet;
use crate::error::{CountError, Result};
use crate::hash::{hash_family, Hash64, HashFamily, HashKind};

struct FilterState {
    bits: BitVector,
    hashes: Vec<Box<dyn Hash64>>,
}

pub struct BloomFilter {
    m: u64,
    k: u64,
    state: Mutex<FilterState>,
    accepted: AtomicU64,
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("m", &self.m)
            .field("k", &self.k)
            .field("accepted", &self.count())
            .finish()
    }
}

impl BloomFilter {
    /// Size a filter for `elements` keys at false-positive rate `fp_rate`.
    ///
    /// Fails with `InvalidArgument` if `elements == 0`, `fp_rate` is outside
    /// (0, 1), or no hash family is given.
    pub fn new(elements: u64, fp_rate: f64, family: Option<&dyn HashFamily>) -> Result<Self> {
        let family = family.ok_or_else(|| CountError::invalid("hash family cannot be absent"))?;
        let (m, k) = optimal_params(elements, fp_rate)?;

        let hashes = family.get_hashes(k);
        if hashes.len() as u64 != k {
            return Err(CountError::invalid(format!(
                "hash family returned {} instances, expected {}",
                hashes.len(),
                k
            )));
        }

        Ok(Self {
            m,
            k,
            state: Mutex::new(FilterState {
                bits: BitVector::new(m),
                hashes,
            }),
            accepted: AtomicU64::new(0),
        })
    }

    /// Same as `new`, with the family picked by kind.
    pub fn with_kind(elements: u64, fp_rate: f64, kind: HashKind) -> Result<Self> {
        let family = hash_family(kind);
        Self::new(elements, fp_rate, Some(family.as_ref()))
    }

    /// Set the k bits of `key`. Always increments the accepted count.
    pub fn add(&self, key: &[u8]) {
        let mut guard = self.lock_state();
        let FilterState { bits, hashes } = &mut *guard;
        for h in hashes.iter_mut() {
            let bit = digest(h.as_mut(), key) % self.m;
            bits.set(bit);
        }
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// true iff all k bits of `key` are set. false => `key` was never added.
    pub fn test(&self, key: &[u8]) -> bool {
        let mut guard = self.lock_state();
        let FilterState { bits, hashes } = &mut *guard;
        for h in hashes.iter_mut() {
            let bit = digest(h.as_mut(), key) % self.m;
            if !bits.get(bit) {
                return false;
            }
        }
        true
    }

    /// Number of add() calls so far.
    #[inline]
    pub fn count(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// Bit vector length (m).
    #[inline]
    pub fn bits(&self) -> u64 {
        self.m
    }

    /// Hash function count (k).
    #[inline]
    pub fn hashes(&self) -> u64 {
        self.k
    }

    /// Bytes used by the bit vector.
    pub fn byte_len(&self) -> usize {
        self.lock_state().bits.byte_len()
    }

    /// Share of bits currently set, 0.0..=1.0.
    pub fn fill_ratio(&self) -> f64 {
        let ones = self.lock_state().bits.count_ones();
        ones as f64 / self.m as f64
    }

    fn lock_state(&self) -> MutexGuard<'_, FilterState> {
        match self.state.lock() {
            Ok(g) => g,
            // Паника внутри секции = битовое состояние больше не доверенное.
            Err(_) => panic!("bloom filter state poisoned: a writer panicked mid-update"),
        }
    }
}

impl KeySet for BloomFilter {
    fn test(&self, key: &[u8]) -> bool {
        BloomFilter::test(self, key)
    }

    fn add(&self, key: &[u8]) {
        BloomFilter::add(self, key)
    }

    fn count(&self) -> u64 {
        BloomFilter::count(self)
    }
}

// Reset + write + sum. A failed or short write is a broken invariant.
#[inline]
fn digest(h: &mut dyn Hash64, key: &[u8]) -> u64 {
    h.reset();
    match h.write(key) {
        Ok(n) if n == key.len() => h.sum64(),
        Ok(n) => panic!("hash write consumed {} of {} bytes", n, key.len()),
        Err(e) => panic!("hash write failed: {}", e),
    }
}
