//! Bounded blocking queue throughput and latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)

use std::env;
use std::hint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use corral::{BoundedQueue, Timeout};

const QUEUE_SIZE: usize = 1 << 12;
const ITERATIONS: usize = 1 << 20;

type Payload = i32;

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env::var("PRODUCER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(0));
    let consumer_cpu = env::var("CONSUMER_CPU")
        .ok()
        .and_then(|s| s.parse().ok())
        .or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_throughput(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE));

    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let consumer_queue = Arc::clone(&queue);

    // Consumer thread
    let consumer_thread = std::thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        // Signal ready
        ready_clone.store(true, Ordering::Release);

        for expected in 0..ITERATIONS as Payload {
            let value = consumer_queue
                .pop_front(Timeout::Infinite)
                .expect("pop failed");
            if value != expected {
                panic!("Data corruption: expected {}, got {}", expected, value);
            }
        }
    });

    // Wait for consumer to be ready
    while !ready.load(Ordering::Acquire) {
        hint::spin_loop();
    }

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..ITERATIONS as Payload {
        queue.push_back(i, Timeout::Infinite).expect("push failed");
    }

    consumer_thread.join().unwrap();
    let elapsed = start.elapsed();

    let ops_per_ms = ITERATIONS as u128 * 1_000_000 / elapsed.as_nanos();
    println!("{} ops/ms", ops_per_ms);
}

fn bench_rtt(producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    // Ping-pong latency: RTT includes two parks and two wakes per round.
    const RTT_ITERATIONS: usize = 1 << 16;

    let ping = Arc::new(BoundedQueue::<Payload>::new(1));
    let pong = Arc::new(BoundedQueue::<Payload>::new(1));

    let ready = Arc::new(AtomicBool::new(false));
    let ready_clone = ready.clone();
    let ping_rx = Arc::clone(&ping);
    let pong_tx = Arc::clone(&pong);

    // Responder thread
    let responder = std::thread::spawn(move || {
        pin_to_cpu(consumer_cpu);

        // Signal ready
        ready_clone.store(true, Ordering::Release);

        for _ in 0..RTT_ITERATIONS {
            let value = ping_rx.pop_front(Timeout::Infinite).expect("pop failed");
            pong_tx
                .push_back(value, Timeout::Infinite)
                .expect("push failed");
        }
    });

    // Wait for responder to be ready
    while !ready.load(Ordering::Acquire) {
        hint::spin_loop();
    }

    pin_to_cpu(producer_cpu);

    let start = Instant::now();

    for i in 0..RTT_ITERATIONS as Payload {
        ping.push_back(i, Timeout::Infinite).expect("push failed");
        let _ = pong.pop_front(Timeout::Infinite).expect("pop failed");
    }

    let elapsed = start.elapsed();
    responder.join().unwrap();

    let rtt_ns = elapsed.as_nanos() / RTT_ITERATIONS as u128;
    println!("{} ns RTT", rtt_ns);
}

fn main() {
    corral::init_tracing();
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();

    println!("corral BoundedQueue (size={}, iters={}):", QUEUE_SIZE, ITERATIONS);
    bench_throughput(producer_cpu, consumer_cpu);
    bench_rtt(producer_cpu, consumer_cpu);
}
