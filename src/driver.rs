// SPDX-License-Identifier: MIT

use crate::barriers::LaunchGate;
use crate::config::ReduceConfig;
use crate::error::{ReduceError, Result};
use crate::observer::{ProgressObserver, TracingObserver};
use crate::table::PartialSumTable;
use crate::worker::{run_worker, ReductionContext, WorkerContext, WorkerOutcome};
use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};
use tracing::{debug, warn};

/// A validated `(thread_count, upper_bound)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComputationRequest {
    thread_count: usize,
    upper_bound: u64,
}

impl ComputationRequest {
    /// Validates that both values are positive.
    pub fn new(thread_count: i64, upper_bound: i64) -> Result<Self> {
        if thread_count <= 0 {
            return Err(ReduceError::InvalidArgument(format!(
                "thread_count must be a positive integer, got {thread_count}"
            )));
        }
        if upper_bound <= 0 {
            return Err(ReduceError::InvalidArgument(format!(
                "upper_bound must be a positive integer, got {upper_bound}"
            )));
        }
        let thread_count = usize::try_from(thread_count).map_err(|_| {
            ReduceError::InvalidArgument(format!(
                "thread_count {thread_count} does not fit this platform"
            ))
        })?;

        Ok(ComputationRequest {
            thread_count,
            upper_bound: upper_bound as u64,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn upper_bound(&self) -> u64 {
        self.upper_bound
    }

    fn worker_context(&self, id: usize) -> WorkerContext {
        WorkerContext {
            id,
            thread_count: self.thread_count,
            upper_bound: self.upper_bound,
        }
    }
}

/// Computes `sum(i^0.25 for i in 1..=upper_bound)` with `thread_count`
/// workers, default configuration, and progress reported through `tracing`.
pub fn compute(thread_count: i64, upper_bound: i64) -> Result<f64> {
    ComputationDriver::new().compute(thread_count, upper_bound)
}

/// Owns the shared state of a computation, launches and joins the workers,
/// and hands back the reduced total.
pub struct ComputationDriver {
    config: ReduceConfig,
    observer: Box<dyn ProgressObserver + Send + Sync>,
}

impl ComputationDriver {
    /// Creates a driver with the default configuration and a
    /// [`TracingObserver`].
    pub fn new() -> Self {
        Self::with_config(ReduceConfig::default())
    }

    pub fn with_config(config: ReduceConfig) -> Self {
        ComputationDriver {
            config,
            observer: Box::new(TracingObserver),
        }
    }

    /// Replaces the progress observer.
    pub fn with_observer(
        mut self,
        observer: impl ProgressObserver + Send + Sync + 'static,
    ) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &ReduceConfig {
        &self.config
    }

    /// Validates the arguments, then runs the computation.
    pub fn compute(&self, thread_count: i64, upper_bound: i64) -> Result<f64> {
        let request = ComputationRequest::new(thread_count, upper_bound)?;
        self.run(&request)
    }

    /// Runs the computation for an already validated request.
    ///
    /// Table, barrier and threads all live inside this call: threads are
    /// spawned in a [`thread::scope`] and joined before it returns, on the
    /// error paths too.
    pub fn run(&self, request: &ComputationRequest) -> Result<f64> {
        self.run_with(request, |id| Ok(self.thread_builder(id)))
    }

    /// Runs `request`, asking `make_builder` for each worker's thread
    /// builder. An error from `make_builder` is handled like a failed spawn.
    fn run_with(
        &self,
        request: &ComputationRequest,
        make_builder: impl Fn(usize) -> io::Result<thread::Builder>,
    ) -> Result<f64> {
        let thread_count = request.thread_count();
        let shared = ReductionContext::new(
            PartialSumTable::new(thread_count)?,
            self.config.barrier.build(thread_count),
        );
        let gate = LaunchGate::new();

        debug!(
            thread_count,
            upper_bound = request.upper_bound(),
            barrier = %self.config.barrier,
            accumulation = %self.config.accumulation,
            "starting computation"
        );

        let total = thread::scope(|scope| -> Result<f64> {
            let mut handles = Vec::new();
            handles.try_reserve_exact(thread_count).map_err(|_| {
                ReduceError::AllocationFailure {
                    what: "worker handles",
                    requested: thread_count,
                }
            })?;

            for id in 0..thread_count {
                let ctx = request.worker_context(id);
                let spawned = make_builder(id).and_then(|builder| {
                    self.spawn_worker(builder, scope, ctx, &shared, &gate)
                });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(source) => {
                        warn!(worker_id = id, error = %source, "worker launch failed");
                        // Parked workers leave without touching the barrier.
                        gate.abort();
                        join_workers(handles)?;
                        return Err(ReduceError::WorkerLaunchFailure {
                            worker_id: id,
                            source,
                        });
                    }
                }
            }

            gate.open();
            join_workers(handles)?;
            Ok(shared.table.get(0))
        })?;

        self.observer.on_total(total);
        Ok(total)
    }

    /// Named, optionally sized builder for worker `id`.
    fn thread_builder(&self, id: usize) -> thread::Builder {
        let builder = thread::Builder::new()
            .name(format!("{}-{}", self.config.thread_name_prefix, id));
        match self.config.stack_size {
            Some(stack_size) => builder.stack_size(stack_size),
            None => builder,
        }
    }

    fn spawn_worker<'scope, 'env>(
        &'env self,
        builder: thread::Builder,
        scope: &'scope Scope<'scope, 'env>,
        ctx: WorkerContext,
        shared: &'env ReductionContext,
        gate: &'env LaunchGate,
    ) -> io::Result<ScopedJoinHandle<'scope, WorkerOutcome>> {
        let accumulation = self.config.accumulation;
        let observer = self.observer.as_ref();
        builder.spawn_scoped(scope, move || {
            run_worker(ctx, shared, gate, accumulation, observer)
        })
    }
}

impl Default for ComputationDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Joins every handle, even after one of them reports a panic, and returns
/// the first panic seen. Peers of a panicked worker come back
/// [`WorkerOutcome::Abandoned`] once the barrier breaks, so this never waits
/// on them forever.
fn join_workers(handles: Vec<ScopedJoinHandle<'_, WorkerOutcome>>) -> Result<()> {
    let mut first_panic = None;
    for (worker_id, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() && first_panic.is_none() {
            first_panic = Some(worker_id);
        }
    }
    match first_panic {
        Some(worker_id) => Err(ReduceError::WorkerPanicked { worker_id }),
        None => Ok(()),
    }
}
