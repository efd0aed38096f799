//! Ошибки ядра подсчёта.
//!
//! - InvalidArgument: неверные параметры фильтра/конфига (до начала работы).
//! - Io: ошибка чтения источника или запуска потока; прерывает подсчёт.
//! - WorkerPanicked: воркер упал; состояние фильтра больше не доверенное.
//! - PoolFinished: попытка добавить chunk после Finish().
//! - QueueClosed: все воркеры завершились, chunk'и некому принять.
//!
//! Верхние уровни (count/CLI) оборачивают это в anyhow с контекстом.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CountError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("worker pool already finished")]
    PoolFinished,

    #[error("chunk queue closed: no live workers")]
    QueueClosed,
}

impl CountError {
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        CountError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CountError>;
