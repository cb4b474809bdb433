//! Bounded worker pool for per-item media work.
//!
//! Per-item operations are independent blocking units (child processes or
//! file writes to distinct paths), so they run on a dedicated rayon pool
//! sized by configuration. Results come back in input order.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::errors::{StepError, StepResult};
use crate::logging::RunLogger;

/// Fixed-size pool with a retry limit for each unit.
pub struct WorkerPool {
    pool: ThreadPool,
    retries: u32,
}

impl WorkerPool {
    pub fn new(workers: usize, retries: u32) -> StepResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("narrsync-worker-{}", i))
            .build()
            .map_err(|e| StepError::other(format!("failed to start worker pool: {}", e)))?;
        Ok(Self { pool, retries })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Run `op` over `items` in parallel, returning results in input order.
    ///
    /// Each unit is retried up to the pool's retry limit while
    /// `retryable` says its error is worth another attempt. Progress is
    /// logged under `label` as units finish.
    pub fn map<T, R, E, F, P>(
        &self,
        logger: &RunLogger,
        label: &str,
        items: &[T],
        op: F,
        retryable: P,
    ) -> Vec<Result<R, E>>
    where
        T: Sync,
        R: Send,
        E: Send + std::fmt::Display,
        F: Fn(&T) -> Result<R, E> + Sync,
        P: Fn(&E) -> bool + Sync,
    {
        let done = AtomicUsize::new(0);
        let total = items.len();
        logger.reset_progress();

        self.pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = with_retry(self.retries, || op(item), &retryable, |attempt, e| {
                        logger.debug(&format!(
                            "{}: attempt {} failed, retrying: {}",
                            label, attempt, e
                        ));
                    });
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    logger.progress(label, finished, total);
                    result
                })
                .collect()
        })
    }
}

/// Call `op` until it succeeds, fails with a non-retryable error or has
/// been retried `retries` times.
pub fn with_retry<R, E>(
    retries: u32,
    mut op: impl FnMut() -> Result<R, E>,
    retryable: impl Fn(&E) -> bool,
    mut on_retry: impl FnMut(u32, &E),
) -> Result<R, E> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt <= retries && retryable(&e) => {
                on_retry(attempt, &e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
