// SPDX-License-Identifier: MIT

use crate::accumulate::Accumulation;
use crate::barriers::{CondvarBarrier, ReductionBarrier, SpinBarrier};
use crate::error::ReduceError;
use std::fmt;
use std::str::FromStr;

/// Which barrier implementation the workers synchronize on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BarrierKind {
    /// Mutex and condition variable; waiters sleep.
    #[default]
    Condvar,
    /// Atomic counter; waiters spin, then yield.
    Spin,
}

impl BarrierKind {
    /// Builds a barrier of this kind for `parties` participants.
    pub fn build(self, parties: usize) -> Box<dyn ReductionBarrier + Send + Sync> {
        match self {
            BarrierKind::Condvar => Box::new(CondvarBarrier::new(parties)),
            BarrierKind::Spin => Box::new(SpinBarrier::new(parties)),
        }
    }
}

impl fmt::Display for BarrierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarrierKind::Condvar => f.write_str("condvar"),
            BarrierKind::Spin => f.write_str("spin"),
        }
    }
}

impl FromStr for BarrierKind {
    type Err = ReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "condvar" => Ok(BarrierKind::Condvar),
            "spin" => Ok(BarrierKind::Spin),
            other => Err(ReduceError::InvalidArgument(format!(
                "unknown barrier '{other}', expected 'condvar' or 'spin'"
            ))),
        }
    }
}

/// Tunables for a [`ComputationDriver`](crate::ComputationDriver).
///
/// The default reproduces the reference numeric behaviour: plain `f64`
/// accumulation and a sleeping barrier.
#[derive(Debug, Clone)]
pub struct ReduceConfig {
    /// How each worker sums its own range.
    pub accumulation: Accumulation,
    /// Barrier used between reduction rounds.
    pub barrier: BarrierKind,
    /// Worker threads are named `<prefix>-<id>`.
    pub thread_name_prefix: String,
    /// Stack size for worker threads. `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl Default for ReduceConfig {
    fn default() -> Self {
        ReduceConfig {
            accumulation: Accumulation::default(),
            barrier: BarrierKind::default(),
            thread_name_prefix: "reduce".to_string(),
            stack_size: None,
        }
    }
}

impl ReduceConfig {
    /// Set the per-worker summation.
    pub fn with_accumulation(mut self, accumulation: Accumulation) -> Self {
        self.accumulation = accumulation;
        self
    }

    /// Set the barrier implementation.
    pub fn with_barrier(mut self, barrier: BarrierKind) -> Self {
        self.barrier = barrier;
        self
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Set the worker thread stack size in bytes.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_behaviour() {
        let config = ReduceConfig::default();
        assert_eq!(config.accumulation, Accumulation::Naive);
        assert_eq!(config.barrier, BarrierKind::Condvar);
        assert_eq!(config.thread_name_prefix, "reduce");
        assert_eq!(config.stack_size, None);
    }

    #[test]
    fn test_builder() {
        let config = ReduceConfig::default()
            .with_barrier(BarrierKind::Spin)
            .with_accumulation(Accumulation::Compensated)
            .with_thread_name_prefix("roots")
            .with_stack_size(1 << 20);
        assert_eq!(config.barrier, BarrierKind::Spin);
        assert_eq!(config.accumulation, Accumulation::Compensated);
        assert_eq!(config.thread_name_prefix, "roots");
        assert_eq!(config.stack_size, Some(1 << 20));
    }

    #[test]
    fn test_barrier_kind_parse_and_build() {
        for kind in [BarrierKind::Condvar, BarrierKind::Spin] {
            let parsed: BarrierKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
            assert_eq!(parsed.build(3).parties(), 3);
        }
        assert!("futex".parse::<BarrierKind>().is_err());
    }
}
