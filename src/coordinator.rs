// SPDX-License-Identifier: MIT

//! Pairwise tree combine of the per-worker partial sums.
//!
//! Round `k` uses `step = 2^k`. Worker `tid` is active when
//! `tid % (2 * step) == 0` and, if `tid + step` is a real worker, folds that
//! slot into its own. With 8 workers:
//!
//! ```text
//! step 1: 0 += 1, 2 += 3, 4 += 5, 6 += 7
//! step 2: 0 += 2, 4 += 6
//! step 4: 0 += 4
//! ```
//!
//! Before round `k`, every slot `j` with `j % 2^k == 0` holds the sum of the
//! initial slots `[j, j + 2^k)` (clipped to the worker count). Each round
//! doubles the block, so after `ceil(log2(m))` rounds slot 0 holds the total.
//! Within a round the written slots (multiples of `2 * step`) and the read
//! partner slots (odd multiples of `step`) never overlap, and a barrier
//! separates rounds.

use crate::barriers::{BrokenBarrier, ReductionBarrier};
use crate::table::PartialSumTable;
use tracing::debug;

/// Reduction schedule for a fixed number of workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeReduction {
    thread_count: usize,
}

impl TreeReduction {
    pub fn new(thread_count: usize) -> Self {
        debug_assert!(thread_count > 0);
        TreeReduction { thread_count }
    }

    /// Number of combine rounds, `ceil(log2(thread_count))`.
    pub fn rounds(&self) -> usize {
        (usize::BITS - (self.thread_count - 1).leading_zeros()) as usize
    }

    /// Step values `1, 2, 4, ...` strictly below the worker count.
    pub fn steps(&self) -> impl Iterator<Item = usize> {
        let thread_count = self.thread_count;
        std::iter::successors(Some(1usize), |step| step.checked_mul(2))
            .take_while(move |&step| step < thread_count)
    }

    /// Slot that `tid` folds into its own during the round with `step`, or
    /// `None` if `tid` is idle in that round.
    pub fn partner(&self, tid: usize, step: usize) -> Option<usize> {
        if tid % (2 * step) != 0 {
            return None;
        }
        let partner = tid + step;
        (partner < self.thread_count).then_some(partner)
    }

    /// Runs every round for worker `tid`.
    ///
    /// Must be called by all `thread_count` workers after the round-0
    /// barrier, each with its own `tid`. Every worker waits on `barrier`
    /// once per round whether or not it combined anything. Stops at the
    /// first round whose barrier is broken.
    pub fn run(
        &self,
        tid: usize,
        table: &PartialSumTable,
        barrier: &(dyn ReductionBarrier + Send + Sync),
    ) -> Result<(), BrokenBarrier> {
        for step in self.steps() {
            if let Some(partner) = self.partner(tid, step) {
                let combined = table.combine(tid, partner);
                debug!(step, tid, partner, combined, "combined partial sums");
            }
            barrier.wait()?;
        }
        Ok(())
    }

    /// Applies the same schedule to `values` on the calling thread. After it
    /// returns, `values[0]` holds the total.
    pub fn reduce_in_place(&self, values: &mut [f64]) {
        debug_assert_eq!(values.len(), self.thread_count);
        for step in self.steps() {
            for tid in 0..self.thread_count {
                if let Some(partner) = self.partner(tid, step) {
                    values[tid] += values[partner];
                }
            }
        }
    }
}
