// SPDX-License-Identifier: MIT

//! Prints the sum of fourth roots of `[1, max_number]`, computed by
//! `num_threads` workers with a tree reduction.
//!
//! ```text
//! cargo run --example fourth_roots -- 4 100
//! RUST_LOG=treereduce=debug cargo run --example fourth_roots -- 8 1000
//! ```

use clap::Parser;
use treereduce::{
    Accumulation, BarrierKind, ComputationDriver, ComputationRequest,
    ProgressObserver, ReduceConfig, WorkRange,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    about = "Sum of fourth roots with a parallel tree reduction",
    allow_negative_numbers = true
)]
struct Args {
    /// Number of parallel threads to use.
    num_threads: i64,

    /// Compute the sum of fourth roots from 1 to this number.
    max_number: i64,

    /// Barrier between reduction rounds: condvar or spin.
    #[arg(long, default_value_t = BarrierKind::Condvar)]
    barrier: BarrierKind,

    /// Per-worker summation: naive or compensated.
    #[arg(long, default_value_t = Accumulation::Naive)]
    accumulation: Accumulation,

    /// Log level when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

/// Prints each report on stdout as it arrives.
struct ConsoleObserver;

impl ProgressObserver for ConsoleObserver {
    fn on_partial(&self, worker_id: usize, range: WorkRange, partial_sum: f64) {
        println!("Thread {worker_id} (range {range}): partial sum = {partial_sum:.6}");
    }

    fn on_total(&self, total: f64) {
        println!();
        println!("========================================");
        println!("Total sum of fourth roots: {total:.6}");
        println!("========================================");
    }
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level)?;
    // Nothing is printed for a request that would be rejected.
    let request = ComputationRequest::new(args.num_threads, args.max_number)?;

    let config = ReduceConfig::default()
        .with_barrier(args.barrier)
        .with_accumulation(args.accumulation);
    let driver = ComputationDriver::with_config(config).with_observer(ConsoleObserver);

    println!(
        "Computing sum of fourth roots from 1 to {} using {} threads...",
        request.upper_bound(),
        request.thread_count()
    );
    println!("Using parallel reduction algorithm (O(log m) combine rounds)\n");

    driver.run(&request)?;
    Ok(())
}
