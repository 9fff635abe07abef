//! # idt-primaries
//!
//! Colour primaries, white points, and RGB-XYZ matrix generation.
//!
//! The solvers in `idt-core` target ACES 2065-1 (AP0 primaries, ACES white).
//! This crate defines those chromaticities and derives the matrices between
//! RGB and CIE XYZ from them.
//!
//! # Usage
//!
//! ```rust
//! use idt_primaries::{ACES_AP0, rgb_to_xyz_matrix};
//! use idt_math::Vec3;
//!
//! let matrix = rgb_to_xyz_matrix(&ACES_AP0);
//! let white = matrix * Vec3::ONE;
//! assert!((white.y - 1.0).abs() < 1e-9);
//! ```
//!
//! # Dependencies
//!
//! - [`idt-math`] - Matrix operations
//!
//! # Used By
//!
//! - `idt-core` - spectral and metadata solvers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use idt_math::{Mat3, Vec3};

/// RGB colour space primaries definition.
///
/// Defines a colour space by its three primary colours (R, G, B) and white
/// point, all specified as CIE xy chromaticity coordinates.
///
/// # Example
///
/// ```rust
/// use idt_primaries::Primaries;
///
/// let my_space = Primaries {
///     r: (0.64, 0.33),
///     g: (0.30, 0.60),
///     b: (0.15, 0.06),
///     w: (0.3127, 0.3290),
///     name: "Custom",
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Primaries {
    /// Red primary (x, y) chromaticity
    pub r: (f64, f64),
    /// Green primary (x, y) chromaticity
    pub g: (f64, f64),
    /// Blue primary (x, y) chromaticity
    pub b: (f64, f64),
    /// White point (x, y) chromaticity
    pub w: (f64, f64),
    /// Colour space name
    pub name: &'static str,
}

impl Primaries {
    /// White point as XYZ (Y=1).
    #[inline]
    pub fn white_xyz(&self) -> Vec3 {
        xy_to_xyz(self.w.0, self.w.1)
    }
}

// ============================================================================
// Standard White Points
// ============================================================================

/// D65 white point chromaticity (daylight, ~6500K).
pub const D65_XY: (f64, f64) = (0.31270, 0.32900);

/// D60 white point chromaticity (~6000K, used by ACES).
pub const D60_XY: (f64, f64) = (0.32168, 0.33767);

// ============================================================================
// Colour Space Primaries
// ============================================================================

/// Rec.709 primaries (D65 white point).
pub const REC709: Primaries = Primaries {
    r: (0.6400, 0.3300),
    g: (0.3000, 0.6000),
    b: (0.1500, 0.0600),
    w: D65_XY,
    name: "Rec.709",
};

/// ACES AP0 primaries (ACES white point).
///
/// Academy Color Encoding System primaries for ACES 2065-1, the target of
/// every IDT produced by this workspace.
pub const ACES_AP0: Primaries = Primaries {
    r: (0.7347, 0.2653),
    g: (0.0000, 1.0000),
    b: (0.0001, -0.0770),
    w: D60_XY,
    name: "ACES AP0",
};

/// ACES AP1 primaries (ACES white point).
pub const ACES_AP1: Primaries = Primaries {
    r: (0.7130, 0.2930),
    g: (0.1650, 0.8300),
    b: (0.1280, 0.0440),
    w: D60_XY,
    name: "ACES AP1",
};

// ============================================================================
// Chromaticity helpers
// ============================================================================

/// Converts xy chromaticity to XYZ (with Y=1).
///
/// Returns zero for a degenerate `y`.
pub fn xy_to_xyz(x: f64, y: f64) -> Vec3 {
    if y.abs() < 1e-12 {
        Vec3::ZERO
    } else {
        Vec3::new(x / y, 1.0, (1.0 - x - y) / y)
    }
}

/// Converts XYZ to xy chromaticity.
///
/// Returns `None` when X + Y + Z is zero.
pub fn xyz_to_xy(xyz: Vec3) -> Option<(f64, f64)> {
    let sum = xyz.sum();
    if sum.abs() < 1e-12 {
        None
    } else {
        Some((xyz.x / sum, xyz.y / sum))
    }
}

// ============================================================================
// Matrix generation
// ============================================================================

/// Computes the RGB to XYZ matrix for a set of primaries.
///
/// # Algorithm
///
/// 1. Convert xy chromaticities to XYZ (with Y=1)
/// 2. Compute scaling factors so white point maps correctly
/// 3. Multiply primaries by scaling factors
///
/// # Example
///
/// ```rust
/// use idt_primaries::{REC709, rgb_to_xyz_matrix};
///
/// let m = rgb_to_xyz_matrix(&REC709);
/// assert!((m.m[1][0] - 0.2126729).abs() < 1e-4);
/// ```
pub fn rgb_to_xyz_matrix(primaries: &Primaries) -> Mat3 {
    let r_xyz = xy_to_xyz(primaries.r.0, primaries.r.1);
    let g_xyz = xy_to_xyz(primaries.g.0, primaries.g.1);
    let b_xyz = xy_to_xyz(primaries.b.0, primaries.b.1);
    let w_xyz = primaries.white_xyz();

    let m = Mat3::from_col_vecs(r_xyz, g_xyz, b_xyz);

    // S = M^-1 * W
    let m_inv = m.inverse().unwrap_or(Mat3::IDENTITY);
    let s = m_inv * w_xyz;

    Mat3::from_col_vecs(r_xyz * s.x, g_xyz * s.y, b_xyz * s.z)
}

/// Computes the XYZ to RGB matrix for a set of primaries.
///
/// This is the inverse of [`rgb_to_xyz_matrix`].
pub fn xyz_to_rgb_matrix(primaries: &Primaries) -> Mat3 {
    rgb_to_xyz_matrix(primaries).inverse().unwrap_or(Mat3::IDENTITY)
}

/// XYZ of ACES RGB (1, 1, 1).
///
/// The adaptation target for every white point in the solvers.
pub fn aces_white_xyz() -> Vec3 {
    rgb_to_xyz_matrix(&ACES_AP0) * Vec3::ONE
}
