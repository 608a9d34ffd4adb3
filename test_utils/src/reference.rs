// SPDX-License-Identifier: MIT

/// Single-threaded sum of `i^0.25` for `i` in `[1, upper_bound]`, added in
/// increasing order.
pub fn sequential_sum(upper_bound: u64) -> f64 {
    let mut sum = 0.0f64;
    for i in 1..=upper_bound {
        sum += (i as f64).powf(0.25);
    }
    sum
}

/// Asserts that `actual` is within `relative` of `expected`.
pub fn assert_close(actual: f64, expected: f64, relative: f64) {
    let scale = expected.abs().max(f64::MIN_POSITIVE);
    assert!(
        (actual - expected).abs() / scale <= relative,
        "{actual} is not within {relative:e} of {expected}"
    );
}
