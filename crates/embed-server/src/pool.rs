//! Bounded execution of blocking inference.
//!
//! Inference occupies a CPU for its whole duration, so it runs on tokio's
//! blocking pool instead of the async workers. At most `max_concurrent`
//! jobs run at once and at most `max_queued` wait behind them; anything
//! beyond that is turned away immediately.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("inference queue is full")]
    Busy,

    #[error(transparent)]
    Worker(#[from] JoinError),
}

pub struct InferencePool {
    /// Running plus waiting jobs
    admission: Arc<Semaphore>,
    /// Running jobs
    workers: Arc<Semaphore>,
    capacity: usize,
}

impl InferencePool {
    /// `max_concurrent` is raised to at least 1.
    pub fn new(max_concurrent: usize, max_queued: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let capacity = max_concurrent + max_queued;
        Self {
            admission: Arc::new(Semaphore::new(capacity)),
            workers: Arc::new(Semaphore::new(max_concurrent)),
            capacity,
        }
    }

    /// Jobs currently running or waiting.
    pub fn in_flight(&self) -> usize {
        self.capacity - self.admission.available_permits()
    }

    /// Run `job` on the blocking pool once a worker slot frees up.
    ///
    /// The worker slot is held by the job itself, so a caller that gives up
    /// waiting does not free capacity while the job is still running.
    pub async fn run<F, T>(&self, job: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let admitted = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| PoolError::Busy)?;

        // Neither semaphore is ever closed
        let worker = self
            .workers
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PoolError::Busy)?;

        let result = tokio::task::spawn_blocking(move || {
            let _worker = worker;
            let _admitted = admitted;
            job()
        })
        .await?;

        Ok(result)
    }
}
