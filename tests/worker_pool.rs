use anyhow::Result;
use oorandom::Rand64;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uniqip::bloom::{BloomFilter, KeySet};
use uniqip::{Chunk, CountError, HashKind, WorkerPool, WorkerState};

/// Точное множество с искусственной задержкой на add: для проверки drain.
struct ExactSet {
    seen: Mutex<HashSet<Vec<u8>>>,
    adds: AtomicU64,
    delay: Duration,
}

impl ExactSet {
    fn new(delay: Duration) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            adds: AtomicU64::new(0),
            delay,
        }
    }
}

impl KeySet for ExactSet {
    fn test(&self, key: &[u8]) -> bool {
        self.seen.lock().unwrap().contains(key)
    }

    fn add(&self, key: &[u8]) {
        std::thread::sleep(self.delay);
        self.seen.lock().unwrap().insert(key.to_vec());
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    fn count(&self) -> u64 {
        self.adds.load(Ordering::Relaxed)
    }
}

fn chunk_of(keys: impl Iterator<Item = String>) -> Chunk {
    let mut s = String::new();
    for k in keys {
        s.push_str(&k);
        s.push('\n');
    }
    Chunk::from(s.as_str())
}

/// finish() сразу после последнего add(): ни один chunk из очереди не теряется.
#[test]
fn finish_drains_every_queued_chunk() -> Result<()> {
    let set = Arc::new(ExactSet::new(Duration::from_micros(200)));
    let keys: Arc<dyn KeySet> = set.clone();
    let mut pool = WorkerPool::new(4, 2, keys)?;
    pool.start()?;

    for c in 0..50 {
        pool.add(chunk_of((0..20).map(|i| format!("key-{}-{}", c, i))))?;
    }
    pool.finish()?;

    assert_eq!(set.count(), 1_000);
    let m = pool.metrics();
    assert_eq!(m.chunks_processed, 50);
    assert_eq!(m.lines_scanned, 1_000);
    assert_eq!(m.keys_inserted, 1_000);
    assert_eq!(pool.worker_states(), vec![WorkerState::Stopped; 4]);
    assert_eq!(pool.queued(), 0);
    Ok(())
}

/// Повторный finish(): не паникует, не блокирует, count не меняется.
#[test]
fn finish_twice_is_noop() -> Result<()> {
    let bf = Arc::new(BloomFilter::with_kind(100, 0.001, HashKind::Xx64)?);
    let keys: Arc<dyn KeySet> = bf.clone();
    let mut pool = WorkerPool::new(3, 4, keys)?;
    pool.start()?;
    pool.add(Chunk::from("a\nb\na\n"))?;
    pool.finish()?;
    let after_first = bf.count();
    pool.finish()?;
    assert_eq!(bf.count(), after_first);
    assert_eq!(after_first, 2);
    assert!(pool.is_finished());

    let err = pool.add(Chunk::from("c\n")).unwrap_err();
    assert!(matches!(err, CountError::PoolFinished));
    drop(pool); // Drop -> finish() третий раз
    assert_eq!(bf.count(), 2);
    Ok(())
}

#[test]
fn finish_without_start_is_fine() -> Result<()> {
    let bf = Arc::new(BloomFilter::with_kind(10, 0.01, HashKind::Xx64)?);
    let mut pool = WorkerPool::new(2, 1, bf)?;
    pool.finish()?;
    pool.finish()?;
    assert!(pool.worker_states().is_empty());
    Ok(())
}

#[test]
fn start_twice_is_rejected() -> Result<()> {
    let bf = Arc::new(BloomFilter::with_kind(10, 0.01, HashKind::Xx64)?);
    let mut pool = WorkerPool::new(1, 1, bf)?;
    pool.start()?;
    assert!(pool.start().is_err());
    pool.finish()?;
    Ok(())
}

#[test]
fn zero_workers_or_queue_rejected() {
    let bf: Arc<dyn KeySet> = Arc::new(BloomFilter::with_kind(10, 0.01, HashKind::Xx64).unwrap());
    assert!(matches!(
        WorkerPool::new(0, 1, bf.clone()),
        Err(CountError::InvalidArgument(_))
    ));
    assert!(matches!(
        WorkerPool::new(1, 0, bf),
        Err(CountError::InvalidArgument(_))
    ));
}

/// D уникальных ключей через W воркеров: count >= D, переучёт мал при D >> W.
#[test]
fn concurrent_count_is_close_to_distinct() -> Result<()> {
    let distinct = 20_000u64;
    let bf = Arc::new(BloomFilter::with_kind(distinct * 2, 1e-7, HashKind::Xx64)?);
    let keys: Arc<dyn KeySet> = bf.clone();
    let mut pool = WorkerPool::new(8, 8, keys)?;
    pool.start()?;

    // Каждый ключ трижды, в перемешанном порядке.
    let mut all: Vec<u64> = (0..distinct).flat_map(|i| [i, i, i]).collect();
    let mut rng = Rand64::new(0xD15);
    for i in (1..all.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        all.swap(i, j);
    }
    for part in all.chunks(100) {
        pool.add(chunk_of(part.iter().map(|k| format!("10.{}.{}.{}", k >> 16, (k >> 8) & 0xff, k & 0xff))))?;
    }
    pool.finish()?;

    let count = bf.count();
    assert!(count >= distinct, "count {} < distinct {}", count, distinct);
    assert!(count <= distinct + distinct / 50, "overcount too large: {}", count);
    Ok(())
}

struct Exploding;

impl KeySet for Exploding {
    fn test(&self, key: &[u8]) -> bool {
        if key == b"boom" {
            panic!("test double exploded");
        }
        false
    }
    fn add(&self, _key: &[u8]) {}
    fn count(&self) -> u64 {
        0
    }
}

#[test]
fn worker_panic_surfaces_from_finish() -> Result<()> {
    let mut pool = WorkerPool::new(2, 1, Arc::new(Exploding))?;
    pool.start()?;
    pool.add(Chunk::from("boom\n"))?;
    let err = pool.finish().unwrap_err();
    assert!(matches!(err, CountError::WorkerPanicked(id) if id < 2), "{}", err);
    // Упавший воркер тоже закончил в Stopped.
    assert_eq!(pool.worker_states(), vec![WorkerState::Stopped; 2]);
    // Второй вызов ошибку не повторяет.
    pool.finish()?;
    Ok(())
}
