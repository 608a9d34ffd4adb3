// SPDX-License-Identifier: MIT

use super::{BarrierWaitResult, BrokenBarrier, ReductionBarrier};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

/// Barrier that spins on atomics instead of sleeping in the kernel.
///
/// Suited to short rounds with no more parties than cores. When the machine
/// is oversubscribed, waiters yield right away so the parties still missing
/// get scheduled.
pub struct SpinBarrier {
    /// Parties that have arrived in the current round.
    count: AtomicUsize,
    /// Incremented each time a round releases.
    generation: AtomicUsize,
    /// Set once by `break_barrier`; never cleared.
    broken: AtomicBool,
    /// Number of parties required to release a round.
    parties: usize,
    /// Spin iterations before falling back to `yield_now`.
    spin_limit: u32,
}

impl SpinBarrier {
    /// Creates a barrier for `parties` participants.
    pub fn new(parties: usize) -> Self {
        let cores = thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(1);
        let spin_limit = if parties > cores {
            0
        } else {
            ((cores - parties + 1) as u32).saturating_mul(32).min(256)
        };

        SpinBarrier {
            count: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
            broken: AtomicBool::new(false),
            parties,
            spin_limit,
        }
    }
}

impl ReductionBarrier for SpinBarrier {
    fn wait(&self) -> Result<BarrierWaitResult, BrokenBarrier> {
        if self.broken.load(Ordering::Acquire) {
            return Err(BrokenBarrier);
        }

        // Must be read before arriving: once our arrival is counted the
        // round may release at any moment.
        let generation = self.generation.load(Ordering::Acquire);

        if self.count.fetch_add(1, Ordering::AcqRel) + 1 == self.parties {
            self.count.store(0, Ordering::Relaxed);
            self.generation
                .store(generation.wrapping_add(1), Ordering::Release);
            return Ok(BarrierWaitResult::new(true));
        }

        let mut spins = 0u32;
        while self.generation.load(Ordering::Acquire) == generation {
            if self.broken.load(Ordering::Acquire) {
                return Err(BrokenBarrier);
            }
            if spins < self.spin_limit {
                std::hint::spin_loop();
                spins += 1;
            } else {
                thread::yield_now();
            }
        }
        Ok(BarrierWaitResult::new(false))
    }

    fn break_barrier(&self) {
        self.broken.store(true, Ordering::Release);
    }

    fn parties(&self) -> usize {
        self.parties
    }
}
