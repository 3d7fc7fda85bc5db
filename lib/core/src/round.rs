//! Decimal rounding shared by the matcher and the aggregator.

/// Decimals kept for stored match scores.
pub const STORED_SCORE_DECIMALS: u32 = 5;

/// Decimals kept for scores returned to API callers.
pub const RESPONSE_SCORE_DECIMALS: u32 = 4;

/// Decimals kept for reference values and deviations.
pub const REFERENCE_DECIMALS: u32 = 4;

/// Round to `decimals` places, ties to even.
#[inline]
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round_ties_even() / scale
}
