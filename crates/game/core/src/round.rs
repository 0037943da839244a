//! The single float-to-integer rounding rule used across the crate.
//!
//! Every cast from a fractional intermediate (damage after resistance,
//! multipliers, coerced variable reads) goes through [`to_int`]. Halves round
//! away from zero, so `2.5 -> 3` and `-2.5 -> -3` on every platform.

/// Rounds half away from zero and saturates at the `i64` bounds.
///
/// NaN maps to zero so a corrupted variable can never poison integer state.
#[inline]
pub fn to_int(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    // `as` saturates for out-of-range floats.
    value.round() as i64
}

/// Multiplies an integer by a ratio and rounds with [`to_int`].
#[inline]
pub fn scale(value: i64, ratio: f64) -> i64 {
    to_int(value as f64 * ratio)
}
