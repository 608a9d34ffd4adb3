// SPDX-License-Identifier: MIT

use std::fmt;
use std::ops::RangeInclusive;

/// An inclusive range `[start, end]` of integers assigned to one worker.
///
/// A range with `start > end` is empty. Empty ranges occur whenever the
/// upper bound is smaller than the number of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkRange {
    /// First integer of the range.
    pub start: u64,
    /// Last integer of the range (inclusive).
    pub end: u64,
}

impl WorkRange {
    /// Creates the inclusive range `[start, end]`.
    pub fn new(start: u64, end: u64) -> Self {
        WorkRange { start, end }
    }

    /// Returns true if the range holds no integers.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of integers in the range.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Iterates the range in increasing order. Yields nothing when empty.
    pub fn iter(&self) -> RangeInclusive<u64> {
        self.start..=self.end
    }
}

impl fmt::Display for WorkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Returns the range of `[1, upper_bound]` owned by `worker_id`.
///
/// Every worker gets `upper_bound / total_workers` integers; the last worker
/// also absorbs the remainder.
///
/// # Arguments
/// * `worker_id` - Worker index in `[0, total_workers)`
/// * `total_workers` - Number of workers, at least 1
/// * `upper_bound` - Largest integer to cover, at least 1
pub fn partition(
    worker_id: usize,
    total_workers: usize,
    upper_bound: u64,
) -> WorkRange {
    debug_assert!(total_workers > 0 && worker_id < total_workers);

    let chunk = upper_bound / total_workers as u64;
    let start = worker_id as u64 * chunk + 1;

    // Last worker picks up the `upper_bound % total_workers` leftovers.
    let end = if worker_id == total_workers - 1 {
        upper_bound
    } else {
        (worker_id as u64 + 1) * chunk
    };

    WorkRange::new(start, end)
}

/// Ranges of every worker in id order.
pub fn partition_all(
    total_workers: usize,
    upper_bound: u64,
) -> impl Iterator<Item = WorkRange> {
    (0..total_workers).map(move |id| partition(id, total_workers, upper_bound))
}
