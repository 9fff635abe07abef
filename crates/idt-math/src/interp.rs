//! Interpolation utilities.
//!
//! Scalar helpers used by the colour temperature tables and by spectral
//! resampling.
//!
//! # Usage
//!
//! ```rust
//! use idt_math::{lerp, sample_uniform};
//!
//! assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
//!
//! // Samples at 380, 390, 400 nm
//! let values = [1.0, 2.0, 4.0];
//! assert_eq!(sample_uniform(380.0, 10.0, &values, 395.0), Some(3.0));
//! assert_eq!(sample_uniform(380.0, 10.0, &values, 405.0), None);
//! ```

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse of [`lerp`]: where `value` lies between `a` and `b`.
///
/// Returns 0 when `a == b`.
#[inline]
pub fn inverse_lerp(a: f64, b: f64, value: f64) -> f64 {
    if a == b { 0.0 } else { (value - a) / (b - a) }
}

/// Sign of `x` as -1, 0 or 1.
///
/// Unlike [`f64::signum`], zero maps to zero.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Linearly samples a uniformly spaced table.
///
/// `values[i]` is the sample at `first + i * step`. Returns `None` when `x`
/// lies outside the table (beyond a small tolerance at the ends).
pub fn sample_uniform(first: f64, step: f64, values: &[f64], x: f64) -> Option<f64> {
    if values.is_empty() || step <= 0.0 {
        return None;
    }
    let pos = (x - first) / step;
    let last = (values.len() - 1) as f64;
    const EDGE: f64 = 1e-9;
    if pos < -EDGE || pos > last + EDGE {
        return None;
    }
    let pos = pos.clamp(0.0, last);
    let i = pos.floor() as usize;
    if i + 1 >= values.len() {
        return Some(values[values.len() - 1]);
    }
    Some(lerp(values[i], values[i + 1], pos - i as f64))
}
