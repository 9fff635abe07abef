//! CIE 1976 L*a*b*.
//!
//! The IDT fit measures colour error as the Lab difference between the
//! reference and the transformed camera response, both relative to the
//! ACES white.

use idt_math::Vec3;

/// (6/29)^3
const EPSILON: f64 = 216.0 / 24389.0;
/// (29/6)^2 / 3
const SLOPE: f64 = 841.0 / 108.0;

fn lab_f(t: f64) -> f64 {
    if t > EPSILON {
        t.cbrt()
    } else {
        SLOPE * t + 4.0 / 29.0
    }
}

/// Converts XYZ to L*a*b* relative to `white`.
pub fn xyz_to_lab(xyz: Vec3, white: Vec3) -> Vec3 {
    let n = xyz.div_elem(white);
    let (fx, fy, fz) = (lab_f(n.x), lab_f(n.y), lab_f(n.z));
    Vec3::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}
