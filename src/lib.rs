// SPDX-License-Identifier: MIT

//! Sum of fourth roots over `[1, n]` computed by a fixed set of worker
//! threads that combine their partial sums with a barrier-gated tree
//! reduction.
//!
//! ```
//! let total = treereduce::compute(4, 100).unwrap();
//! assert!((total - 254.243559).abs() < 1e-5);
//! ```

pub mod accumulate;
pub mod barriers;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod observer;
pub mod partition;
pub mod table;
pub mod worker;

pub use accumulate::Accumulation;
pub use barriers::{BarrierWaitResult, ReductionBarrier};
pub use config::{BarrierKind, ReduceConfig};
pub use driver::{compute, ComputationDriver, ComputationRequest};
pub use error::{ReduceError, Result};
pub use observer::{NoopObserver, ProgressObserver, TracingObserver};
pub use partition::{partition, WorkRange};
