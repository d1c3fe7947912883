//! Fixed-size worker pool over a [`BlockingQueue`].
//!
//! Workers loop on `pop`, which returns empty after the poll timeout, and
//! check the shutdown flag between pops. Shutdown is cooperative: a worker in
//! the middle of a task finishes it before it notices the flag, and items
//! still queued at shutdown are dropped unrun.
//!
//! The pool does not track completion. Callers that need to wait for a batch
//! use a [`CountdownLatch`]:
//!
//! ```
//! use std::sync::Arc;
//! use bmpfx::pool::{CountdownLatch, WorkerPool};
//!
//! let pool = WorkerPool::new(4)?;
//! let latch = Arc::new(CountdownLatch::new(16));
//! for i in 0..16u32 {
//!     let done = latch.guard();
//!     pool.submit(|n: u32| n * n, i, Some(Box::new(move |_sq: u32| drop(done))))?;
//! }
//! latch.wait()?;
//! pool.shutdown()?;
//! # Ok::<(), bmpfx::PoolError>(())
//! ```

mod latch;
mod queue;
mod work;

pub use latch::{CountdownGuard, CountdownLatch};
pub use queue::{BlockingQueue, DEFAULT_POLL_TIMEOUT};
pub use work::{ResultCallback, WorkItem};

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, trace};

use crate::error::PoolError;

/// Environment variable read by [`PoolConfig::default`] for the thread count.
pub const NUM_THREADS_ENV: &str = "BMPFX_NUM_THREADS";

/// Worker pool settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub threads: usize,
    /// How long an idle worker waits on the queue before re-checking for shutdown.
    pub poll_timeout: Duration,
    /// Worker threads are named `{thread_name}-{index}`.
    pub thread_name: String,
}

impl Default for PoolConfig {
    /// `BMPFX_NUM_THREADS` if set to a positive number, else the available
    /// parallelism, else 1.
    fn default() -> Self {
        Self {
            threads: default_threads(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            thread_name: String::from("bmpfx-worker"),
        }
    }
}

impl PoolConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }

    pub fn poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

fn default_threads() -> usize {
    let from_env = std::env::var(NUM_THREADS_ENV)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0);
    from_env.unwrap_or_else(|| {
        thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// A fixed group of threads consuming work items from one shared queue.
///
/// Dropping the pool shuts it down the same way [`shutdown`](Self::shutdown)
/// does, discarding any error.
#[derive(Debug)]
pub struct WorkerPool {
    queue: Arc<BlockingQueue<WorkItem>>,
    terminate: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// A pool of `threads` workers with the default poll timeout.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        Self::with_config(&PoolConfig::with_threads(threads))
    }

    pub fn with_config(config: &PoolConfig) -> Result<Self, PoolError> {
        if config.threads == 0 {
            return Err(PoolError::ZeroThreads);
        }
        let queue = Arc::new(BlockingQueue::with_poll_timeout(config.poll_timeout));
        let terminate = Arc::new(AtomicBool::new(false));
        let mut pool = Self {
            queue,
            terminate,
            workers: Vec::with_capacity(config.threads),
        };

        for index in 0..config.threads {
            let queue = Arc::clone(&pool.queue);
            let terminate = Arc::clone(&pool.terminate);
            let spawned = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name))
                .spawn(move || worker_loop(index, &queue, &terminate));
            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    // Already-started workers are joined when `pool` drops.
                    error!("failed to spawn worker {index}: {e}");
                    return Err(PoolError::Spawn(e));
                }
            }
        }
        debug!(
            "worker pool started with {} threads, poll timeout {:?}",
            config.threads, config.poll_timeout
        );
        Ok(pool)
    }

    /// Number of worker threads.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Items waiting in the queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue `task(data)` for execution on some worker. If given, `callback`
    /// receives the task's result on the same worker.
    pub fn submit<D, T, F>(
        &self,
        task: F,
        data: D,
        callback: Option<ResultCallback<T>>,
    ) -> Result<(), PoolError>
    where
        F: FnOnce(D) -> T + Send + 'static,
        D: Send + 'static,
        T: 'static,
    {
        self.queue.push(WorkItem::new(task, data, callback))
    }

    /// Queue a closure.
    pub fn execute<F>(&self, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.queue.push(WorkItem::from_fn(f))
    }

    /// Set the termination flag and join every worker. Each worker exits
    /// within one poll timeout of its current task finishing.
    pub fn shutdown(mut self) -> Result<(), PoolError> {
        self.stop_workers()
    }

    fn stop_workers(&mut self) -> Result<(), PoolError> {
        if self.workers.is_empty() {
            return Ok(());
        }
        self.terminate.store(true, Ordering::Release);
        let panicked = self
            .workers
            .drain(..)
            .map(JoinHandle::join)
            .filter(Result::is_err)
            .count();

        let discarded = self.queue.drain().map_or(0, |items| items.len());
        if discarded > 0 {
            debug!("worker pool shut down with {discarded} unrun item(s)");
        } else {
            debug!("worker pool shut down");
        }

        if panicked > 0 {
            return Err(PoolError::WorkerPanicked(panicked));
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.stop_workers() {
            error!("worker pool shutdown: {e}");
        }
    }
}

fn worker_loop(index: usize, queue: &BlockingQueue<WorkItem>, terminate: &AtomicBool) {
    trace!("worker {index} started");
    while !terminate.load(Ordering::Acquire) {
        match queue.pop() {
            Ok(Some(item)) => {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(|| item.run())) {
                    error!("worker {index}: task panicked: {}", panic_message(&*panic));
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!("worker {index}: {e}");
                break;
            }
        }
    }
    trace!("worker {index} exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
