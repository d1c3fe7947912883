use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::PoolError;

/// How long [`BlockingQueue::pop`] waits on an empty queue by default.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Unbounded, thread-safe FIFO with a bounded-wait pop.
///
/// `pop` gives up after the poll timeout instead of blocking forever, so a
/// consumer can re-check a shutdown flag between waits.
#[derive(Debug)]
pub struct BlockingQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    poll_timeout: Duration,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self::with_poll_timeout(DEFAULT_POLL_TIMEOUT)
    }

    pub fn with_poll_timeout(poll_timeout: Duration) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            poll_timeout,
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Append an item and wake every waiting consumer.
    pub fn push(&self, item: T) -> Result<(), PoolError> {
        let mut items = self.items.lock().map_err(|_| PoolError::Poisoned)?;
        items.push_back(item);
        self.not_empty.notify_all();
        Ok(())
    }

    /// Remove the front item, waiting up to the poll timeout for one to arrive.
    /// Returns `Ok(None)` if the queue is still empty when the timeout expires.
    pub fn pop(&self) -> Result<Option<T>, PoolError> {
        let deadline = Instant::now() + self.poll_timeout;
        let mut items = self.items.lock().map_err(|_| PoolError::Poisoned)?;
        loop {
            if let Some(item) = items.pop_front() {
                return Ok(Some(item));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            // Spurious wakeups and lost races go around again until the deadline.
            let (guard, _) = self
                .not_empty
                .wait_timeout(items, deadline - now)
                .map_err(|_| PoolError::Poisoned)?;
            items = guard;
        }
    }

    /// Remove the front item without waiting.
    pub fn try_pop(&self) -> Result<Option<T>, PoolError> {
        let mut items = self.items.lock().map_err(|_| PoolError::Poisoned)?;
        Ok(items.pop_front())
    }

    pub fn len(&self) -> usize {
        self.items.lock().map_or(0, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return everything still queued.
    pub fn drain(&self) -> Result<Vec<T>, PoolError> {
        let mut items = self.items.lock().map_err(|_| PoolError::Poisoned)?;
        Ok(items.drain(..).collect())
    }
}
