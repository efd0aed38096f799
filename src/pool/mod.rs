//! WorkerPool: W потоков над одной ограниченной очередью chunk'ов и одним KeySet.
//!
//! - start(): поднимает W воркеров; у каждого свой stop-канал (bounded(1)).
//! - add(chunk): кладёт chunk в очередь; при полной очереди блокирует (backpressure).
//! - finish(): идемпотентен. Первый вызов шлёт ровно один stop каждому воркеру,
//!   ждёт join всех потоков (воркеры дочищают очередь) и освобождает очередь.
//!   Повторные вызовы (и Drop) ничего не делают.

pub mod worker;

use std::sync::atomic::AtomicU8;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::bloom::KeySet;
use crate::error::{CountError, Result};
use crate::metrics::{Counters, MetricsSnapshot};
use crate::reader::Chunk;

pub use worker::{process_chunk, ChunkStats, WorkerState};
use worker::Worker;

pub struct WorkerPool {
    workers: usize,
    keys: Arc<dyn KeySet>,
    counters: Arc<Counters>,

    tx: Option<Sender<Chunk>>,
    // Держим только до start(): потом каналом владеют воркеры.
    rx: Option<Receiver<Chunk>>,

    closers: Vec<Sender<()>>,
    handles: Vec<JoinHandle<()>>,
    states: Vec<Arc<AtomicU8>>,

    started: bool,
    finished: bool,
}

impl WorkerPool {
    pub fn new(workers: usize, queue_capacity: usize, keys: Arc<dyn KeySet>) -> Result<Self> {
        if workers == 0 {
            return Err(CountError::invalid("worker count must be greater than zero"));
        }
        if queue_capacity == 0 {
            return Err(CountError::invalid("queue capacity must be greater than zero"));
        }
        let (tx, rx) = bounded::<Chunk>(queue_capacity);
        Ok(Self {
            workers,
            keys,
            counters: Arc::new(Counters::new()),
            tx: Some(tx),
            rx: Some(rx),
            closers: Vec::with_capacity(workers),
            handles: Vec::with_capacity(workers),
            states: Vec::with_capacity(workers),
            started: false,
            finished: false,
        })
    }

    /// Share counters with the reader so one snapshot covers the whole run.
    pub fn with_counters(mut self, counters: Arc<Counters>) -> Self {
        self.counters = counters;
        self
    }

    /// Spawn the workers. Calling it twice is an error.
    pub fn start(&mut self) -> Result<()> {
        if self.started || self.finished {
            return Err(CountError::invalid("worker pool already started"));
        }
        let rx = self.rx.take().ok_or(CountError::PoolFinished)?;
        self.started = true;

        for id in 0..self.workers {
            let (stop_tx, stop_rx) = bounded::<()>(1);
            let state = Arc::new(AtomicU8::new(WorkerState::Running as u8));
            let w = Worker {
                id,
                input: rx.clone(),
                stop: stop_rx,
                keys: Arc::clone(&self.keys),
                state: Arc::clone(&state),
                counters: Arc::clone(&self.counters),
            };
            let handle = thread::Builder::new()
                .name(format!("uniqip-worker-{id}"))
                .spawn(move || w.run());
            match handle {
                Ok(h) => {
                    self.closers.push(stop_tx);
                    self.handles.push(h);
                    self.states.push(state);
                }
                Err(e) => {
                    error!("worker {}: spawn failed: {}", id, e);
                    // Уже запущенные дочищаем и останавливаем.
                    let _ = self.finish();
                    return Err(CountError::Io(e));
                }
            }
        }
        debug!("worker pool: {} workers started", self.workers);
        Ok(())
    }

    /// Enqueue a chunk. Blocks while the queue is full.
    pub fn add(&self, chunk: Chunk) -> Result<()> {
        if self.finished {
            return Err(CountError::PoolFinished);
        }
        let tx = self.tx.as_ref().ok_or(CountError::PoolFinished)?;
        tx.send(chunk).map_err(|_| CountError::QueueClosed)
    }

    /// Stop every worker once, wait for the drain, release the queue.
    /// Safe to call any number of times.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        for closer in &self.closers {
            // bounded(1) и ровно одна отправка: не блокирует.
            let _ = closer.send(());
        }

        let mut failed = None;
        for (id, h) in self.handles.drain(..).enumerate() {
            if h.join().is_err() {
                error!("worker {}: panicked", id);
                failed.get_or_insert(CountError::WorkerPanicked(id));
            }
        }

        self.closers.clear();
        self.tx = None;
        self.rx = None;

        let m = self.counters.snapshot();
        info!(
            "all workers finished: chunks={} lines={} inserted={}",
            m.chunks_processed, m.lines_scanned, m.keys_inserted
        );

        match failed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Chunks waiting in the queue right now.
    pub fn queued(&self) -> usize {
        self.tx.as_ref().map(|tx| tx.len()).unwrap_or(0)
    }

    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.states
            .iter()
            .map(|s| WorkerState::from_u8(s.load(std::sync::atomic::Ordering::Acquire)))
            .collect()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.counters.snapshot()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!("worker pool shutdown: {}", e);
        }
    }
}
