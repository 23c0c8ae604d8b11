//! End-to-end tests for the bounded blocking queue under thread contention.
//!
//! These tests exercise the full blocking flow:
//! 1. Producer threads push until the queue fills and they park
//! 2. Consumer threads pop until the queue drains and they park
//! 3. Every element crosses exactly once, in FIFO order per producer
//!
//! # Running with tracing
//!
//! To see full debug output, run with the tracing feature and no capture:
//! ```bash
//! cargo test --features tracing -- --nocapture
//! ```
//!
//! You can control the log level via RUST_LOG:
//! ```bash
//! RUST_LOG=corral=debug cargo test --features tracing -- --nocapture
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};

use serial_test::serial;

use corral::{BoundedQueue, Timeout};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        corral::init_tracing();
    });
}

#[test]
fn spsc_blocking_preserves_fifo_order() {
    init_test_tracing();

    // Capacity far below the item count so both sides park repeatedly.
    let queue = Arc::new(BoundedQueue::new(8));
    let count = 50_000u64;

    let producer_queue = Arc::clone(&queue);
    let producer = thread::spawn(move || {
        for i in 0..count {
            producer_queue
                .push_back(i, Timeout::Infinite)
                .unwrap_or_else(|_| panic!("push {i} failed"));
        }
    });

    let consumer_queue = Arc::clone(&queue);
    let consumer = thread::spawn(move || {
        for expected in 0..count {
            let got = consumer_queue.pop_front(Timeout::Infinite);
            assert_eq!(got, Some(expected), "FIFO order violated at {expected}");
        }
    });

    producer.join().expect("producer panicked");
    consumer.join().expect("consumer panicked");

    assert!(queue.is_empty());
}

#[test]
fn mpmc_delivers_every_item_exactly_once() {
    init_test_tracing();

    const PRODUCERS: u64 = 4;
    const CONSUMERS: usize = 4;
    const PER_PRODUCER: u64 = 10_000;

    let queue = Arc::new(BoundedQueue::new(16));
    let total = PRODUCERS * PER_PRODUCER;

    let producers: Vec<_> = (0..PRODUCERS)
        .map(|id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    let item = (id << 32) | seq;
                    queue.push_back(item, Timeout::Infinite).expect("push failed");
                }
            })
        })
        .collect();

    let per_consumer = total as usize / CONSUMERS;
    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut received = Vec::with_capacity(per_consumer);
                for _ in 0..per_consumer {
                    received.push(queue.pop_front(Timeout::Infinite).expect("pop failed"));
                }
                received
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("producer panicked");
    }

    let mut seen = HashSet::with_capacity(total as usize);
    for consumer in consumers {
        let received = consumer.join().expect("consumer panicked");

        // Each producer's items arrive at any single consumer in push order.
        for id in 0..PRODUCERS {
            let seqs: Vec<u64> = received
                .iter()
                .filter(|item| *item >> 32 == id)
                .map(|item| item & 0xFFFF_FFFF)
                .collect();
            assert!(
                seqs.windows(2).all(|w| w[0] < w[1]),
                "producer {id} items reordered"
            );
        }

        for item in received {
            assert!(seen.insert(item), "item {item:#x} delivered twice");
        }
    }

    assert_eq!(seen.len(), total as usize);
    assert!(queue.is_empty());
}

#[test]
#[serial]
fn pop_timeout_expires_on_empty_queue() {
    init_test_tracing();

    let queue = BoundedQueue::<u64>::new(4);
    let budget = Duration::from_millis(100);
    // Floor below the budget: the queue's deadline clock and the test's
    // clock are sampled at different instants.
    let floor = budget - Duration::from_millis(10);

    let start = Instant::now();
    assert_eq!(queue.pop_front(Timeout::Duration(budget)), None);
    let elapsed = start.elapsed();

    assert!(elapsed >= floor, "returned after {elapsed:?}, budget {budget:?}");
}

#[test]
#[serial]
fn push_timeout_expires_on_full_queue() {
    init_test_tracing();

    let queue = BoundedQueue::new(2);
    assert!(queue.try_push_back(1u64).is_ok());
    assert!(queue.try_push_back(2u64).is_ok());

    let budget = Duration::from_millis(100);
    let floor = budget - Duration::from_millis(10);
    let start = Instant::now();
    assert_eq!(queue.push_back(3, Timeout::Duration(budget)), Err(3));
    let elapsed = start.elapsed();

    assert!(elapsed >= floor, "returned after {elapsed:?}, budget {budget:?}");

    // The failed push consumed nothing: one pop frees exactly one slot.
    assert_eq!(queue.pop_front(Timeout::Infinite), Some(1));
    assert!(queue.try_push_back(3).is_ok());
    assert_eq!(queue.try_push_back(4), Err(4));
}

#[test]
#[serial]
fn clear_does_not_satisfy_parked_consumer() {
    init_test_tracing();

    // clear() wakes parked consumers but hands them nothing: they resume
    // waiting against their original deadline.
    let queue = Arc::new(BoundedQueue::<u64>::new(4));
    let budget = Duration::from_millis(150);

    let consumer_queue = Arc::clone(&queue);
    let consumer = thread::spawn(move || {
        let start = Instant::now();
        let got = consumer_queue.pop_front(Timeout::Duration(budget));
        (got, start.elapsed())
    });

    thread::sleep(Duration::from_millis(30));
    queue.clear();

    let (got, elapsed) = consumer.join().expect("consumer panicked");
    assert_eq!(got, None);
    let floor = budget - Duration::from_millis(10);
    assert!(elapsed >= floor, "woke early after {elapsed:?}");
}

#[test]
fn clear_unblocks_parked_producers() {
    init_test_tracing();

    let queue = Arc::new(BoundedQueue::new(2));
    assert!(queue.try_push_back(0u64).is_ok());
    assert!(queue.try_push_back(1u64).is_ok());

    let producers: Vec<_> = (10..12u64)
        .map(|i| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.push_back(i, Timeout::Infinite))
        })
        .collect();

    // Let both producers park on the full queue, then discard its contents.
    thread::sleep(Duration::from_millis(50));
    queue.clear();

    for producer in producers {
        assert!(producer.join().expect("producer panicked").is_ok());
    }

    // Both woken producers landed in the fresh generation, nothing else.
    let mut drained = [
        queue.pop_front(Timeout::Infinite).expect("pop failed"),
        queue.pop_front(Timeout::Infinite).expect("pop failed"),
    ];
    drained.sort_unstable();
    assert_eq!(drained, [10, 11]);
    assert!(queue.is_empty());
}
