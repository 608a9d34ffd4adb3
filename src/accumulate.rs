// SPDX-License-Identifier: MIT

use crate::error::ReduceError;
use crate::partition::WorkRange;
use std::fmt;
use std::str::FromStr;

/// How a worker adds up the fourth roots of its range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Accumulation {
    /// Plain `f64` addition in increasing order.
    #[default]
    Naive,
    /// Neumaier compensated summation. Trades a few extra flops per term for
    /// less rounding drift on very large ranges.
    Compensated,
}

impl Accumulation {
    /// Sum of `i^0.25` for every `i` in `range`. Empty ranges sum to 0.
    pub fn sum_fourth_roots(self, range: WorkRange) -> f64 {
        let terms = range.iter().map(fourth_root);
        match self {
            Accumulation::Naive => terms.fold(0.0, |acc, x| acc + x),
            Accumulation::Compensated => neumaier_sum(terms),
        }
    }
}

impl fmt::Display for Accumulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accumulation::Naive => f.write_str("naive"),
            Accumulation::Compensated => f.write_str("compensated"),
        }
    }
}

impl FromStr for Accumulation {
    type Err = ReduceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "naive" => Ok(Accumulation::Naive),
            "compensated" | "neumaier" => Ok(Accumulation::Compensated),
            other => Err(ReduceError::InvalidArgument(format!(
                "unknown accumulation '{other}', expected 'naive' or 'compensated'"
            ))),
        }
    }
}

/// `x^0.25`.
#[inline]
pub fn fourth_root(x: u64) -> f64 {
    (x as f64).powf(0.25)
}

fn neumaier_sum(terms: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0f64;
    let mut compensation = 0.0f64;
    for x in terms {
        let t = sum + x;
        if sum.abs() >= x.abs() {
            compensation += (sum - t) + x;
        } else {
            compensation += (x - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}
