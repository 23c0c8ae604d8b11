//! Counting semaphore with deadline-bounded acquisition.
//!
//! A shared counter guarded by a mutex and condition variable. Acquisition
//! blocks while the count is zero, either indefinitely or until an absolute
//! deadline computed at call start. Spurious condition-variable wake-ups are
//! absorbed internally; callers only ever observe "acquired" or "timed out".
//!
//! Each semaphore owns its own synchronization state; nothing here is
//! process-wide.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use minstant::Instant;

/// Timeout specification for blocking operations.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// A counting semaphore: a non-negative permit count supporting
/// block-until-available decrement and always-succeeding increment.
///
/// Unlike an OS semaphore, [`Semaphore::reset`] is well-defined while other
/// threads are parked in [`Semaphore::acquire`]: waiters are woken and
/// re-evaluate against the fresh count.
pub struct Semaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore holding `permits` permits.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            count: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Acquires one permit, blocking per `timeout`.
    ///
    /// With [`Timeout::Duration`], the deadline is fixed when the call starts;
    /// spurious wake-ups resume the wait against that same deadline. Returns
    /// `false` on timeout without consuming a permit.
    pub fn acquire(&self, timeout: Timeout) -> bool {
        let mut count = self.lock();
        match timeout {
            Timeout::Infinite => {
                while *count == 0 {
                    count = self
                        .available
                        .wait(count)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            Timeout::Duration(d) => {
                let deadline = Instant::now() + d;
                while *count == 0 {
                    let now = Instant::now();
                    if now >= deadline {
                        return false;
                    }
                    let (guard, _) = self
                        .available
                        .wait_timeout(count, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    count = guard;
                }
            }
        }
        *count -= 1;
        true
    }

    /// Acquires one permit without blocking.
    ///
    /// Returns `false` if no permit is available.
    pub fn try_acquire(&self) -> bool {
        let mut count = self.lock();
        if *count == 0 {
            return false;
        }
        *count -= 1;
        true
    }

    /// Releases one permit, waking one parked waiter.
    pub fn release(&self) {
        let mut count = self.lock();
        *count += 1;
        self.available.notify_one();
    }

    /// Discards the current count and installs `permits` in its place.
    ///
    /// All parked waiters are woken so they re-check against the new count;
    /// those that still find it zero go back to waiting against their
    /// original deadline.
    pub fn reset(&self, permits: usize) {
        let mut count = self.lock();
        *count = permits;
        self.available.notify_all();
    }

    /// Current permit count. Snapshot only.
    #[must_use]
    pub fn permits(&self) -> usize {
        *self.lock()
    }

    // The critical sections here are integer ops and cannot panic, so a
    // poisoned lock still guards a consistent count.
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
