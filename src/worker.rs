// SPDX-License-Identifier: MIT

use crate::accumulate::Accumulation;
use crate::barriers::{
    BreakOnPanic, BrokenBarrier, GateSignal, LaunchGate, ReductionBarrier,
};
use crate::coordinator::TreeReduction;
use crate::observer::ProgressObserver;
use crate::partition::{partition, WorkRange};
use crate::table::PartialSumTable;
use tracing::debug;

/// Everything one worker needs to know about its share of the job. Fixed
/// once handed to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    /// Worker id in `[0, thread_count)`; also the index of its slot.
    pub id: usize,
    /// Total number of workers.
    pub thread_count: usize,
    /// Largest integer of the whole computation.
    pub upper_bound: u64,
}

impl WorkerContext {
    /// The part of `[1, upper_bound]` this worker sums.
    pub fn range(&self) -> WorkRange {
        partition(self.id, self.thread_count, self.upper_bound)
    }
}

/// State shared by all workers of one computation: the partial-sum table
/// and the barrier that separates rounds.
pub struct ReductionContext {
    pub table: PartialSumTable,
    pub barrier: Box<dyn ReductionBarrier + Send + Sync>,
}

impl ReductionContext {
    pub fn new(
        table: PartialSumTable,
        barrier: Box<dyn ReductionBarrier + Send + Sync>,
    ) -> Self {
        debug_assert_eq!(table.len(), barrier.parties());
        ReductionContext { table, barrier }
    }
}

/// How a worker's run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkerOutcome {
    /// Summed `range` to `partial_sum` and took part in every round.
    Completed { range: WorkRange, partial_sum: f64 },
    /// The launch was aborted before the worker was allowed to start.
    Aborted,
    /// A peer panicked and broke the barrier; the table is incomplete.
    Abandoned,
}

/// One worker thread's body.
///
/// Waits at `gate`, sums its own range into its slot, reports the partial
/// sum, then runs the tree reduction with its peers. A panic anywhere in
/// here, the observer included, breaks the barrier so peers stop waiting.
pub fn run_worker(
    ctx: WorkerContext,
    shared: &ReductionContext,
    gate: &LaunchGate,
    accumulation: Accumulation,
    observer: &(dyn ProgressObserver + Send + Sync),
) -> WorkerOutcome {
    if gate.wait() == GateSignal::Abort {
        debug!(worker_id = ctx.id, "launch aborted, worker exiting");
        return WorkerOutcome::Aborted;
    }

    let _guard = BreakOnPanic::new(shared.barrier.as_ref());
    match reduce(ctx, shared, accumulation, observer) {
        Ok((range, partial_sum)) => {
            WorkerOutcome::Completed { range, partial_sum }
        }
        Err(BrokenBarrier) => {
            debug!(worker_id = ctx.id, "barrier broken, worker exiting");
            WorkerOutcome::Abandoned
        }
    }
}

fn reduce(
    ctx: WorkerContext,
    shared: &ReductionContext,
    accumulation: Accumulation,
    observer: &(dyn ProgressObserver + Send + Sync),
) -> Result<(WorkRange, f64), BrokenBarrier> {
    // Phase 1: own range, own slot.
    let range = ctx.range();
    let partial_sum = accumulation.sum_fourth_roots(range);
    shared.table.set(ctx.id, partial_sum);
    observer.on_partial(ctx.id, range, partial_sum);

    // Every slot is filled once this round releases.
    shared.barrier.wait()?;

    // Phase 2: combine rounds.
    TreeReduction::new(ctx.thread_count).run(
        ctx.id,
        &shared.table,
        shared.barrier.as_ref(),
    )?;

    Ok((range, partial_sum))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barriers::CondvarBarrier;
    use crate::observer::NoopObserver;

    fn context(thread_count: usize) -> ReductionContext {
        ReductionContext::new(
            PartialSumTable::new(thread_count).unwrap(),
            Box::new(CondvarBarrier::new(thread_count)),
        )
    }

    #[test]
    fn test_context_range() {
        let ctx = WorkerContext {
            id: 1,
            thread_count: 4,
            upper_bound: 100,
        };
        assert_eq!(ctx.range(), WorkRange::new(26, 50));
    }

    #[test]
    fn test_single_worker_fills_slot_zero() {
        let shared = context(1);
        let gate = LaunchGate::new();
        gate.open();
        let ctx = WorkerContext {
            id: 0,
            thread_count: 1,
            upper_bound: 16,
        };

        let outcome =
            run_worker(ctx, &shared, &gate, Accumulation::Naive, &NoopObserver);

        let expected = Accumulation::Naive.sum_fourth_roots(WorkRange::new(1, 16));
        assert_eq!(
            outcome,
            WorkerOutcome::Completed {
                range: WorkRange::new(1, 16),
                partial_sum: expected,
            }
        );
        assert_eq!(shared.table.get(0), expected);
    }

    #[test]
    fn test_aborted_worker_leaves_table_untouched() {
        let shared = context(3);
        let gate = LaunchGate::new();
        gate.abort();
        let ctx = WorkerContext {
            id: 2,
            thread_count: 3,
            upper_bound: 30,
        };

        // Would block forever on the barrier if it got past the gate.
        let outcome =
            run_worker(ctx, &shared, &gate, Accumulation::Naive, &NoopObserver);

        assert_eq!(outcome, WorkerOutcome::Aborted);
        assert_eq!(shared.table.snapshot(), vec![0.0; 3]);
    }

    #[test]
    fn test_broken_barrier_abandons_reduction() {
        let shared = context(2);
        let gate = LaunchGate::new();
        gate.open();
        shared.barrier.break_barrier();
        let ctx = WorkerContext {
            id: 0,
            thread_count: 2,
            upper_bound: 10,
        };

        // Worker 1 never runs; without the break this would block forever.
        let outcome =
            run_worker(ctx, &shared, &gate, Accumulation::Naive, &NoopObserver);

        assert_eq!(outcome, WorkerOutcome::Abandoned);
    }
}
