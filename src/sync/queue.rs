//! Bounded blocking FIFO queue for in-process (inter-thread) communication.
//!
//! A fixed-capacity queue using mutex-guarded storage and two counting
//! semaphores: one tracking free slots (parks producers when full), one
//! tracking occupied slots (parks consumers when empty).
//!
//! # Overview
//!
//! - [`BoundedQueue::push_back`] - blocking insert at the tail
//! - [`BoundedQueue::pop_front`] - blocking removal from the head
//! - Strict FIFO: elements come out in exactly the order they went in
//! - Mutex-based: chosen for simplicity over a lock-free design
//!
//! # Example
//!
//! ```
//! use corral::{BoundedQueue, Timeout};
//!
//! let queue = BoundedQueue::new(16);
//!
//! // Producer thread
//! queue.push_back(42u64, Timeout::Infinite).expect("queue full");
//!
//! // Consumer thread
//! assert_eq!(queue.pop_front(Timeout::Infinite), Some(42));
//! ```
//!
//! # Differences from a lock-free ring
//!
//! - Any number of producer and consumer threads may share one queue
//! - Waiting parks the OS thread instead of spinning
//! - Capacity is a runtime value, not a const generic

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::sync::semaphore::Semaphore;
use crate::trace::{debug, trace};

pub use crate::sync::semaphore::Timeout;

/// Capacity used by [`BoundedQueue::default`].
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Fixed-capacity thread-safe FIFO queue with blocking push and pop.
///
/// Elements are moved in by producers and moved out by consumers; a push
/// that times out hands the rejected element back to the caller.
///
/// # Thread Safety
///
/// `BoundedQueue` is [`Send`] and [`Sync`] for `T: Send`. Share it between
/// threads behind an `Arc`; every operation takes `&self`.
///
/// # Semaphore discipline
///
/// The slot semaphores are acquired OUTSIDE the storage lock, so a producer
/// parked on a full queue never blocks consumers (or [`BoundedQueue::len`])
/// from taking the storage lock. The lock is held only for the storage
/// mutation and the matching permit release.
pub struct BoundedQueue<T> {
    storage: Mutex<VecDeque<T>>,
    /// Free slots. Producers acquire, consumers release.
    free: Semaphore,
    /// Occupied slots. Consumers acquire, producers release.
    occupied: Semaphore,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Creates a queue holding at most `capacity` elements.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be greater than 0");

        Self {
            storage: Mutex::new(VecDeque::with_capacity(capacity)),
            free: Semaphore::new(capacity),
            occupied: Semaphore::new(0),
            capacity,
        }
    }

    /// Maximum number of elements the queue can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `item` at the tail, parking the calling thread per `timeout`
    /// while the queue is full.
    ///
    /// With [`Timeout::Duration`], the deadline is fixed when the call
    /// starts; spurious wake-ups resume the wait against that same deadline.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` on timeout, handing the element back for retry.
    pub fn push_back(&self, item: T, timeout: Timeout) -> Result<(), T> {
        if !self.free.acquire(timeout) {
            trace!("push_back timed out, queue full");
            return Err(item);
        }
        let mut storage = self.lock_storage();
        storage.push_back(item);
        self.occupied.release();
        Ok(())
    }

    /// Appends `item` at the tail without blocking.
    ///
    /// # Errors
    ///
    /// Returns `Err(item)` if the queue is full, allowing retry.
    pub fn try_push_back(&self, item: T) -> Result<(), T> {
        if !self.free.try_acquire() {
            return Err(item);
        }
        let mut storage = self.lock_storage();
        storage.push_back(item);
        self.occupied.release();
        Ok(())
    }

    /// Removes and returns the head (oldest element), parking the calling
    /// thread per `timeout` while the queue is empty.
    ///
    /// Returns `None` on timeout, leaving storage untouched.
    #[must_use]
    pub fn pop_front(&self, timeout: Timeout) -> Option<T> {
        if !self.occupied.acquire(timeout) {
            trace!("pop_front timed out, queue empty");
            return None;
        }
        let mut storage = self.lock_storage();
        match storage.pop_front() {
            Some(item) => {
                self.free.release();
                Some(item)
            }
            // A clear() wiped storage between our permit acquisition and the
            // storage lock. The permit belongs to the discarded generation;
            // drop it and report the queue empty.
            None => {
                debug!("pop_front raced with clear(), discarding stale permit");
                None
            }
        }
    }

    /// Removes and returns the head without blocking.
    ///
    /// Returns `None` if the queue is empty.
    #[must_use]
    pub fn try_pop_front(&self) -> Option<T> {
        if !self.occupied.try_acquire() {
            return None;
        }
        let mut storage = self.lock_storage();
        match storage.pop_front() {
            Some(item) => {
                self.free.release();
                Some(item)
            }
            None => {
                debug!("try_pop_front raced with clear(), discarding stale permit");
                None
            }
        }
    }

    /// Number of elements currently stored. Snapshot only; may be stale
    /// immediately after return under concurrent access.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_storage().len()
    }

    /// Whether the queue currently holds no elements. Snapshot only.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discards all stored elements and restores the slot counts to their
    /// initial state (all slots free, none occupied).
    ///
    /// Threads parked in [`BoundedQueue::push_back`] or
    /// [`BoundedQueue::pop_front`] are woken to re-evaluate against the fresh
    /// counts: parked producers proceed into the emptied queue, parked
    /// consumers resume waiting against their original deadline. A consumer
    /// that had already claimed an element when the reset discarded it
    /// reports the queue empty instead. Callers that need a quiescent reset
    /// should stop producers and consumers first.
    pub fn clear(&self) {
        let mut storage = self.lock_storage();
        debug!(discarded = storage.len(), "clearing queue");
        storage.clear();
        // Reset under the storage lock, mirroring the push/pop sections
        // which signal while holding it.
        self.free.reset(self.capacity);
        self.occupied.reset(0);
    }

    // The critical sections only mutate the VecDeque, so a poisoned lock
    // still guards consistent storage.
    fn lock_storage(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for BoundedQueue<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
