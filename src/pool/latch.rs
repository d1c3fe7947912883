use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::PoolError;

/// Blocks waiters until a fixed number of completions have been counted.
///
/// The pool does not track completion itself; a caller fanning out a batch
/// creates one latch per batch, counts down once per finished task, and waits.
#[derive(Debug)]
pub struct CountdownLatch {
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CountdownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Record one completion. Extra calls after reaching zero are ignored.
    pub fn count_down(&self) {
        // A poisoned count is still a count.
        let mut remaining = self.remaining.lock().unwrap_or_else(|e| e.into_inner());
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.zero.notify_all();
            }
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Block until the count reaches zero.
    pub fn wait(&self) -> Result<(), PoolError> {
        let remaining = self.remaining.lock().map_err(|_| PoolError::Poisoned)?;
        let _done = self
            .zero
            .wait_while(remaining, |r| *r > 0)
            .map_err(|_| PoolError::Poisoned)?;
        Ok(())
    }

    /// Block until the count reaches zero or `timeout` passes. Returns whether
    /// the count reached zero.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool, PoolError> {
        let deadline = Instant::now() + timeout;
        let mut remaining = self.remaining.lock().map_err(|_| PoolError::Poisoned)?;
        while *remaining > 0 {
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            let (guard, _) = self
                .zero
                .wait_timeout(remaining, deadline - now)
                .map_err(|_| PoolError::Poisoned)?;
            remaining = guard;
        }
        Ok(true)
    }

    /// A guard that counts down once when dropped, including during unwinding.
    pub fn guard(self: &Arc<Self>) -> CountdownGuard {
        CountdownGuard {
            latch: Arc::clone(self),
        }
    }
}

/// Counts its [`CountdownLatch`] down on drop.
#[derive(Debug)]
pub struct CountdownGuard {
    latch: Arc<CountdownLatch>,
}

impl Drop for CountdownGuard {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
