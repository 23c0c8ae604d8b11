//! Bounded blocking FIFO queue for in-process (inter-thread) communication.
//!
//! The core type is [`BoundedQueue`]: a fixed-capacity queue that hands
//! elements from producer threads to consumer threads in strict FIFO order,
//! blocking (optionally with a deadline) on push when full and on pop when
//! empty.

pub mod sync;

mod trace;

#[doc(inline)]
pub use sync::queue::{BoundedQueue, DEFAULT_CAPACITY};

#[doc(inline)]
pub use sync::semaphore::Timeout;

pub use trace::init_tracing;
