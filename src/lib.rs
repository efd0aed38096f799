// Ядро: фильтр, хэши, чтение chunk'ами, пул воркеров
pub mod bloom;  // src/bloom/{mod,params,bits,filter}.rs
pub mod hash;
pub mod reader;
pub mod pool;   // src/pool/{mod,worker}.rs

// Обвязка: конфиг, ошибки, счётчики, оркестратор
pub mod config;
pub mod error;
pub mod metrics;
pub mod count;

// Удобные реэкспорты
pub use bloom::{BloomFilter, KeySet};
pub use config::{CountBuilder, CountConfig};
pub use count::{count_distinct, count_distinct_path, CountReport};
pub use error::CountError;
pub use hash::{HashFamily, HashKind, XxHashFamily};
pub use pool::{WorkerPool, WorkerState};
pub use reader::{Chunk, ChunkReader};
