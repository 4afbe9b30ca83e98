use std::ops::Range;

use rand::Rng;

/// Per-country multiplier is drawn uniformly from this range on every refresh.
pub const MULTIPLIER_RANGE: Range<f64> = 1000.0..2000.0;

/// `population × U / rate`, or exactly 0 without a usable rate.
///
/// The multiplier makes the result differ between refreshes; callers must not compare
/// estimates across runs.
pub fn estimate(population: u64, rate: Option<f64>, rng: &mut impl Rng) -> f64 {
    match usable_rate(rate) {
        Some(rate) => population as f64 * rng.random_range(MULTIPLIER_RANGE) / rate,
        None => 0.0,
    }
}

/// Zero, negative and non-finite rates cannot be divided by and count as missing.
pub fn usable_rate(rate: Option<f64>) -> Option<f64> {
    rate.filter(|r| r.is_finite() && *r > 0.0)
}
