//! Chromatic Adaptation Transforms (CAT).
//!
//! This module provides matrices and functions for adapting colours
//! between different illuminants (white points).
//!
//! # Supported Methods
//!
//! - [`BRADFORD`] - used to move D65-referred XYZ to the ACES white
//! - [`CAT02`] - used to adapt solved camera and illuminant whites
//!
//! # Usage
//!
//! ```rust
//! use idt_math::{adapt_matrix, CAT02, D65, Vec3};
//!
//! let d60 = Vec3::new(0.95265, 1.0, 1.00883);
//! let d65_to_d60 = adapt_matrix(CAT02, D65, d60);
//!
//! let result = d65_to_d60 * D65;
//! assert!((result.z - d60.z).abs() < 1e-9);
//! ```

use crate::{Mat3, Vec3};

/// CIE Standard Illuminant D65 white in XYZ, Y = 1.
///
/// This is the reference white the raw decoder's camera-to-XYZ output is
/// expressed in.
pub const D65: Vec3 = Vec3::new(0.950467, 1.0, 1.088969);

/// Bradford chromatic adaptation matrix.
///
/// Transforms XYZ to a "sharpened" cone response space.
///
/// # Reference
///
/// Lam, K.M. (1985). Metamerism and Colour Constancy.
pub const BRADFORD: Mat3 = Mat3::from_rows([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

/// CAT02 chromatic adaptation matrix.
///
/// From the CIECAM02 colour appearance model.
pub const CAT02: Mat3 = Mat3::from_rows([
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
]);

/// Computes a chromatic adaptation matrix between two white points.
///
/// The resulting matrix transforms XYZ values from the source illuminant
/// to the destination illuminant: `M^-1 * diag(dst / src) * M` with the
/// white points taken into the cone space of `method`.
///
/// # Arguments
///
/// * `method` - The CAT matrix to use ([`BRADFORD`], [`CAT02`])
/// * `src_white` - Source white point in XYZ
/// * `dst_white` - Destination white point in XYZ
pub fn adapt_matrix(method: Mat3, src_white: Vec3, dst_white: Vec3) -> Mat3 {
    let method_inv = method.inverse().unwrap_or(Mat3::IDENTITY);

    let src_cone = method * src_white;
    let dst_cone = method * dst_white;

    let scale = Mat3::diagonal(
        dst_cone.x / src_cone.x,
        dst_cone.y / src_cone.y,
        dst_cone.z / src_cone.z,
    );

    method_inv * scale * method
}
