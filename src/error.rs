// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that can end a `compute` invocation.
///
/// None of them are retried: every resource acquired before the failure is
/// released and the error is handed back to the caller.
#[derive(Error, Debug)]
pub enum ReduceError {
    /// A thread count or upper bound that is not a positive integer, or a
    /// configuration value that could not be parsed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Storage for the partial-sum table or worker bookkeeping could not be
    /// reserved.
    #[error("allocation failure: could not reserve {requested} {what}")]
    AllocationFailure { what: &'static str, requested: usize },

    /// The operating system refused to start a worker thread.
    #[error("failed to launch worker {worker_id}: {source}")]
    WorkerLaunchFailure {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before it could be joined.
    #[error("worker {worker_id} panicked")]
    WorkerPanicked { worker_id: usize },
}

/// Result type alias for reduction operations.
pub type Result<T> = std::result::Result<T, ReduceError>;
