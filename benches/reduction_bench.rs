// SPDX-License-Identifier: MIT

use std::time::Instant;
use treereduce::{BarrierKind, ComputationDriver, NoopObserver, ReduceConfig};

/// Times one tree-reduced sum of fourth roots.
///
/// # Arguments
/// * `thread_count` - Number of worker threads
/// * `upper_bound` - Sum runs over `[1, upper_bound]`
/// * `barrier` - Barrier the workers synchronize on
///
/// # Returns
/// Duration of the computation in seconds
fn benchmark_fourth_root_sum(
    thread_count: i64,
    upper_bound: i64,
    barrier: BarrierKind,
) -> f64 {
    let driver = ComputationDriver::with_config(
        ReduceConfig::default().with_barrier(barrier),
    )
    .with_observer(NoopObserver);

    // Start timing.
    let start_time = Instant::now();

    let total = driver
        .compute(thread_count, upper_bound)
        .expect("benchmark parameters are valid");

    let elapsed_time = start_time.elapsed();

    // Sum grows like 0.8 * n^1.25; anything far off means a broken reduction.
    let estimate = 0.8 * (upper_bound as f64).powf(1.25);
    assert!((total - estimate).abs() / estimate < 0.01);

    elapsed_time.as_secs_f64()
}

fn main() {
    println!("Running benchmarks...\n");

    // Benchmark 1: Different thread counts with a fixed upper bound
    let upper_bound = 50_000_000;
    println!("Benchmark 1: Scaling thread count (upper bound: {upper_bound})");
    for threads in [1, 2, 4, 8, 16] {
        let time =
            benchmark_fourth_root_sum(threads, upper_bound, BarrierKind::Condvar);
        println!("{:2} threads: {:.6} seconds", threads, time);
    }
    println!();

    // Benchmark 2: Different upper bounds with a fixed thread count
    println!("Benchmark 2: Scaling upper bound (4 threads)");
    for size in [1_000_000, 10_000_000, 100_000_000] {
        let time = benchmark_fourth_root_sum(4, size, BarrierKind::Condvar);
        println!("{:9} numbers (4 threads): {:.6} seconds", size, time);
    }
    println!();

    // Benchmark 3: Many workers over little work, where barrier cost shows
    println!("Benchmark 3: Barrier kinds (64 threads, 64,000 numbers)");
    for barrier in [BarrierKind::Condvar, BarrierKind::Spin] {
        let time = benchmark_fourth_root_sum(64, 64_000, barrier);
        println!("{:>8} barrier: {:.6} seconds", barrier.to_string(), time);
    }
}
