// SPDX-License-Identifier: MIT

use super::{BarrierWaitResult, BrokenBarrier, ReductionBarrier};
use std::sync::{Condvar, Mutex, MutexGuard};

/// Arrival count for the current round and the round number itself.
struct BarrierState {
    /// Parties that have arrived in the current round.
    arrived: usize,
    /// Incremented each time a round releases.
    generation: u64,
    /// Set once by `break_barrier`; never cleared.
    broken: bool,
}

/// Barrier built from a mutex-protected counter and a condition variable.
///
/// Waiters remember the generation they arrived in and sleep until it moves
/// on, so spurious wakeups and early re-entry into the next round cannot
/// release anyone too soon.
pub struct CondvarBarrier {
    /// Count of arrivals and round number.
    state: Mutex<BarrierState>,
    /// Signalled when the last party of a round arrives.
    released: Condvar,
    /// Number of parties required to release a round.
    parties: usize,
}

impl CondvarBarrier {
    /// Creates a barrier for `parties` participants.
    pub fn new(parties: usize) -> Self {
        CondvarBarrier {
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                broken: false,
            }),
            released: Condvar::new(),
            parties,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, BarrierState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                self.state.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl ReductionBarrier for CondvarBarrier {
    fn wait(&self) -> Result<BarrierWaitResult, BrokenBarrier> {
        let mut state_guard = self.lock_state();
        if state_guard.broken {
            return Err(BrokenBarrier);
        }
        let generation = state_guard.generation;

        // Record this party's arrival.
        state_guard.arrived += 1;

        // Last to arrive resets the count and opens the next round in the
        // same critical section.
        if state_guard.arrived == self.parties {
            state_guard.arrived = 0;
            state_guard.generation = generation.wrapping_add(1);
            self.released.notify_all();
            return Ok(BarrierWaitResult::new(true));
        }

        // Otherwise, wait for the round we arrived in to be released or for
        // the barrier to break.
        while state_guard.generation == generation {
            if state_guard.broken {
                return Err(BrokenBarrier);
            }
            state_guard = self
                .released
                .wait(state_guard)
                .unwrap_or_else(|e| e.into_inner());
        }
        Ok(BarrierWaitResult::new(false))
    }

    fn break_barrier(&self) {
        let mut state_guard = self.lock_state();
        state_guard.broken = true;
        self.released.notify_all();
    }

    fn parties(&self) -> usize {
        self.parties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barriers::tests::{exercise_barrier, exercise_break};

    #[test]
    fn test_single_party_never_blocks() {
        let barrier = CondvarBarrier::new(1);
        for _ in 0..5 {
            assert!(barrier.wait().unwrap().is_leader());
        }
    }

    #[test]
    fn test_reusable_across_rounds() {
        exercise_barrier(&CondvarBarrier::new(8), 64);
    }

    #[test]
    fn test_odd_party_count() {
        exercise_barrier(&CondvarBarrier::new(7), 32);
    }

    #[test]
    fn test_break_releases_waiters() {
        exercise_break(&CondvarBarrier::new(5));
    }
}
