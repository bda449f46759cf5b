//! Mask-captured tasks.
//!
//! A task spawned inside an SPMD region captures the current mask once and
//! runs as a single unit over all active lanes. It is never fanned out per
//! lane: `spawn_masked` starts exactly one thread and hands the whole mask to
//! the closure.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use thiserror::Error;

use crate::lanes::Mask;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task panicked")]
    Panicked,
    #[error("task ended without reporting a result")]
    Disconnected,
    #[error("task did not finish within {0:?}")]
    Timeout(Duration),
}

/// Result side of one spawned task.
#[derive(Debug)]
pub struct TaskHandle<T> {
    mask: Mask,
    rx: Receiver<Result<T, TaskError>>,
}

pub fn spawn_masked<T, F>(mask: Mask, f: F) -> TaskHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&Mask) -> T + Send + 'static,
{
    let (tx, rx) = bounded(1);
    let captured = mask.clone();
    log::trace!("spawning task over {} of {} lanes", mask.count(), mask.width());
    std::thread::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(|| f(&captured))).map_err(|_| TaskError::Panicked);
        // the handle may already be gone; nothing to report to then
        let _ = tx.send(result);
    });
    TaskHandle { mask, rx }
}

impl<T> TaskHandle<T> {
    /// The mask captured at spawn time.
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn join(self) -> Result<T, TaskError> {
        self.rx.recv().map_err(|_| TaskError::Disconnected)?
    }

    pub fn join_timeout(self, timeout: Duration) -> Result<T, TaskError> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(TaskError::Timeout(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(TaskError::Disconnected),
        }
    }
}
