// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex};
use treereduce::{ProgressObserver, WorkRange};

/// A partial sum as reported by one worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialReport {
    pub worker_id: usize,
    pub range: WorkRange,
    pub partial_sum: f64,
}

/// Observer that keeps every report so tests can inspect them afterwards.
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    partials: Arc<Mutex<Vec<PartialReport>>>,
    totals: Arc<Mutex<Vec<f64>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partial reports sorted by worker id.
    pub fn partials(&self) -> Vec<PartialReport> {
        let mut partials = self.partials.lock().unwrap().clone();
        partials.sort_by_key(|report| report.worker_id);
        partials
    }

    pub fn totals(&self) -> Vec<f64> {
        self.totals.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_partial(&self, worker_id: usize, range: WorkRange, partial_sum: f64) {
        self.partials.lock().unwrap().push(PartialReport {
            worker_id,
            range,
            partial_sum,
        });
    }

    fn on_total(&self, total: f64) {
        self.totals.lock().unwrap().push(total);
    }
}
