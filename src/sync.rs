//! Synchronization primitives for in-process communication.
//!
//! This module provides a blocking bounded queue and the counting semaphore
//! it is built from, for communication between threads within the same
//! process.

pub mod queue;
pub mod semaphore;
