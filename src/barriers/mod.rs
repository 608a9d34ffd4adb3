// SPDX-License-Identifier: MIT

//! Reusable synchronization points shared by the reduction workers.

pub mod condvar_barrier;
pub mod launch_gate;
pub mod spin_barrier;

pub use condvar_barrier::CondvarBarrier;
pub use launch_gate::{GateSignal, LaunchGate};
pub use spin_barrier::SpinBarrier;

use std::thread;
use thiserror::Error;

/// A cyclic barrier for a fixed number of parties.
///
/// `wait` blocks until `parties()` callers have arrived for the current
/// round, then releases all of them and rearms for the next round. A caller
/// that returns from round `k` and immediately waits again is counted
/// towards round `k + 1`, never `k`.
///
/// Every write made before `wait` is visible to every party after the same
/// round releases.
///
/// A party that can no longer arrive (its thread is unwinding) breaks the
/// barrier instead. Breaking releases every current waiter with
/// [`BrokenBarrier`], and every later `wait` fails the same way.
pub trait ReductionBarrier {
    /// Blocks until every party has reached the barrier in this round.
    fn wait(&self) -> Result<BarrierWaitResult, BrokenBarrier>;

    /// Marks the barrier broken and wakes every waiter.
    fn break_barrier(&self);

    /// Number of parties that must arrive before a round releases.
    fn parties(&self) -> usize;
}

/// Returned by [`ReductionBarrier::wait`]. Exactly one party per round is
/// the leader: the last one to arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    is_leader: bool,
}

impl BarrierWaitResult {
    pub(crate) fn new(is_leader: bool) -> Self {
        BarrierWaitResult { is_leader }
    }

    /// True for the single party that completed the round.
    pub fn is_leader(&self) -> bool {
        self.is_leader
    }
}

/// Error from [`ReductionBarrier::wait`] once a party has broken the
/// barrier.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("barrier broken: a party left without arriving")]
pub struct BrokenBarrier;

/// Breaks `barrier` if dropped while its thread is panicking, so the other
/// parties are not left waiting for an arrival that never comes.
pub struct BreakOnPanic<'a> {
    barrier: &'a (dyn ReductionBarrier + Send + Sync),
}

impl<'a> BreakOnPanic<'a> {
    pub fn new(barrier: &'a (dyn ReductionBarrier + Send + Sync)) -> Self {
        BreakOnPanic { barrier }
    }
}

impl Drop for BreakOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.barrier.break_barrier();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};

    /// Runs `parties` threads through `rounds` rounds of `barrier`, checking
    /// that nobody leaves a round before everyone entered it and that each
    /// round has exactly one leader.
    pub(crate) fn exercise_barrier(
        barrier: &(dyn ReductionBarrier + Send + Sync),
        rounds: usize,
    ) {
        let parties = barrier.parties();
        let arrivals: Vec<AtomicUsize> =
            (0..rounds).map(|_| AtomicUsize::new(0)).collect();
        let leaders: Vec<AtomicUsize> =
            (0..rounds).map(|_| AtomicUsize::new(0)).collect();

        thread::scope(|scope| {
            for _ in 0..parties {
                scope.spawn(|| {
                    for round in 0..rounds {
                        arrivals[round].fetch_add(1, SeqCst);
                        if barrier.wait().unwrap().is_leader() {
                            leaders[round].fetch_add(1, SeqCst);
                        }
                        // Released only once the whole round arrived.
                        assert_eq!(arrivals[round].load(SeqCst), parties);
                    }
                });
            }
        });

        for round in 0..rounds {
            assert_eq!(arrivals[round].load(SeqCst), parties);
            assert_eq!(leaders[round].load(SeqCst), 1);
        }
    }

    /// Parks `parties - 1` threads on `barrier`, breaks it, and checks that
    /// every waiter and every later caller gets [`BrokenBarrier`].
    pub(crate) fn exercise_break(barrier: &(dyn ReductionBarrier + Send + Sync)) {
        let waiters = barrier.parties() - 1;
        let parked = AtomicUsize::new(0);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..waiters)
                .map(|_| {
                    scope.spawn(|| {
                        parked.fetch_add(1, SeqCst);
                        barrier.wait()
                    })
                })
                .collect();

            // Waiters may not have reached `wait` yet; breaking first is
            // fine, they fail on entry instead.
            while parked.load(SeqCst) < waiters {
                thread::yield_now();
            }
            barrier.break_barrier();

            for handle in handles {
                assert_eq!(handle.join().unwrap(), Err(BrokenBarrier));
            }
        });

        assert_eq!(barrier.wait(), Err(BrokenBarrier));
    }

    #[test]
    fn test_guard_breaks_only_when_panicking() {
        let barrier = CondvarBarrier::new(2);
        drop(BreakOnPanic::new(&barrier));

        // A normal drop leaves the barrier usable.
        thread::scope(|scope| {
            scope.spawn(|| barrier.wait().unwrap());
            barrier.wait().unwrap();
        });

        thread::scope(|scope| {
            let panicking = scope.spawn(|| {
                let _guard = BreakOnPanic::new(&barrier);
                panic!("worker failed before arriving");
            });
            assert!(panicking.join().is_err());
        });
        assert_eq!(barrier.wait(), Err(BrokenBarrier));
    }
}
