//! Bloom filter: разбиение на подмодули
//! - params.rs: расчёт m/k по (n, p) и ожидаемый FP rate
//! - bits.rs  : упакованный битовый вектор фиксированной длины
//! - filter.rs: BloomFilter (Mutex-секция на add/test, атомарный счётчик)

pub mod bits;
pub mod filter;
pub mod params;

pub use bits::BitVector;
pub use filter::BloomFilter;
pub use params::{expected_fp_rate, optimal_params};

/// Membership seam used by the worker pool.
///
/// `add` is unconditional; callers that want a distinct count must `test`
/// first and only `add` on a miss.
pub trait KeySet: Send + Sync {
    fn test(&self, key: &[u8]) -> bool;
    fn add(&self, key: &[u8]);
    fn count(&self) -> u64;
}
