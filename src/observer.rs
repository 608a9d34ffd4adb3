// SPDX-License-Identifier: MIT

use crate::partition::WorkRange;
use tracing::info;

/// Receives progress reports from a computation. Purely informational: the
/// result does not depend on what an observer does.
pub trait ProgressObserver {
    /// Called once per worker after it has stored its partial sum, before it
    /// enters the reduction rounds. May be called from any worker thread.
    fn on_partial(&self, worker_id: usize, range: WorkRange, partial_sum: f64);

    /// Called once with the reduced total after every worker was joined.
    fn on_total(&self, total: f64);
}

/// Reports progress as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_partial(&self, worker_id: usize, range: WorkRange, partial_sum: f64) {
        info!(
            worker_id,
            range_start = range.start,
            range_end = range.end,
            partial_sum,
            "partial sum computed"
        );
    }

    fn on_total(&self, total: f64) {
        info!(total, "sum of fourth roots");
    }
}

/// Discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_partial(&self, _: usize, _: WorkRange, _: f64) {}

    fn on_total(&self, _: f64) {}
}
