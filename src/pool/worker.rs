//! One worker thread: chunk -> lines -> test-then-add.
//!
//! Состояния: Running -> Draining (получен stop) -> Stopped (очередь пуста).
//! В Running воркер сначала забирает то, что уже лежит в очереди, и только потом
//! блокируется на select(input, stop). В Draining: только try_recv до пустой
//! очереди, поэтому ни один поставленный chunk не теряется при shutdown.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crossbeam_channel::{select, Receiver};
use log::{debug, trace};

use crate::bloom::KeySet;
use crate::metrics::Counters;
use crate::reader::Chunk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    Running = 0,
    Draining = 1,
    Stopped = 2,
}

impl WorkerState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => WorkerState::Running,
            1 => WorkerState::Draining,
            _ => WorkerState::Stopped,
        }
    }
}

/// Per-chunk outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub lines: u64,
    pub empty: u64,
    pub inserted: u64,
}

/// Test every non-empty line of `chunk` and add the misses.
///
/// Two workers may both see `test == false` for the same key before either
/// adds it; the key is then counted twice. That overcount is accepted.
pub fn process_chunk(keys: &dyn KeySet, chunk: &Chunk) -> ChunkStats {
    let mut st = ChunkStats::default();
    for line in chunk.lines() {
        st.lines += 1;
        if line.is_empty() {
            st.empty += 1;
            continue;
        }
        if !keys.test(line) {
            keys.add(line);
            st.inserted += 1;
        }
    }
    st
}

pub(crate) struct Worker {
    pub(crate) id: usize,
    pub(crate) input: Receiver<Chunk>,
    pub(crate) stop: Receiver<()>,
    pub(crate) keys: Arc<dyn KeySet>,
    pub(crate) state: Arc<AtomicU8>,
    pub(crate) counters: Arc<Counters>,
}

impl Worker {
    pub(crate) fn run(self) {
        debug!("worker {}: running", self.id);
        // Stopped ставится и при выходе по панике из KeySet.
        let _stopped = StoppedOnExit(Arc::clone(&self.state));
        loop {
            match self.state() {
                WorkerState::Running => {
                    if let Ok(chunk) = self.input.try_recv() {
                        self.process(&chunk);
                        continue;
                    }
                    select! {
                        recv(self.input) -> msg => match msg {
                            Ok(chunk) => self.process(&chunk),
                            // Очередь закрыта: новых chunk'ов не будет.
                            Err(_) => break,
                        },
                        recv(self.stop) -> _ => {
                            debug!("worker {}: stop received, draining", self.id);
                            self.set_state(WorkerState::Draining);
                        }
                    }
                }
                WorkerState::Draining => match self.input.try_recv() {
                    Ok(chunk) => self.process(&chunk),
                    Err(_) => break,
                },
                WorkerState::Stopped => break,
            }
        }
        debug!("worker {}: stopped", self.id);
    }

    fn process(&self, chunk: &Chunk) {
        let st = process_chunk(self.keys.as_ref(), chunk);
        trace!(
            "worker {}: chunk {} B, lines={} inserted={}",
            self.id,
            chunk.len(),
            st.lines,
            st.inserted
        );
        self.counters.record_chunk_processed(st.lines, st.empty, st.inserted);
    }

    #[inline]
    fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    fn set_state(&self, s: WorkerState) {
        self.state.store(s as u8, Ordering::Release);
    }
}

struct StoppedOnExit(Arc<AtomicU8>);

impl Drop for StoppedOnExit {
    fn drop(&mut self) {
        self.0.store(WorkerState::Stopped as u8, Ordering::Release);
    }
}
