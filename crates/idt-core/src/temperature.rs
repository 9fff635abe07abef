//! Correlated colour temperature math.
//!
//! CCT estimation uses Robertson's method: the Planckian locus is tabulated
//! as 31 isotherms in CIE 1960 uv, each given by a point on the locus and the
//! slope of the isotherm through it. A chromaticity is placed between two
//! adjacent isotherms by its signed distance to each, and the mired value
//! is interpolated from there.
//!
//! The table spans 2000K to 50000K (effectively infinity at the blue end).
//! Results outside that span are clamped without error.
//!
//! # Usage
//!
//! ```rust
//! use idt_core::temperature::{color_temperature_to_xyz, xyz_to_color_temperature};
//!
//! let xyz = color_temperature_to_xyz(5000.0);
//! let cct = xyz_to_color_temperature(xyz);
//! assert!((cct - 5000.0).abs() < 1.0);
//! ```

use idt_math::{Mat3, Vec3, inverse_lerp, sign};
use tracing::trace;

/// Lowest CCT the Robertson table can represent.
pub const CCT_MIN: f64 = 2000.0;

/// Highest CCT the Robertson table can represent.
pub const CCT_MAX: f64 = 50000.0;

/// Robertson isotherms as (u, v, t): locus point and isotherm slope.
const ROBERTSON_UVT: [[f64; 3]; 31] = [
    [0.18006, 0.26352, -0.24341],
    [0.18066, 0.26589, -0.25479],
    [0.18133, 0.26846, -0.26876],
    [0.18208, 0.27119, -0.28539],
    [0.18293, 0.27407, -0.30470],
    [0.18388, 0.27709, -0.32675],
    [0.18494, 0.28021, -0.35156],
    [0.18611, 0.28342, -0.37915],
    [0.18740, 0.28668, -0.40955],
    [0.18880, 0.28997, -0.44278],
    [0.19032, 0.29326, -0.47888],
    [0.19462, 0.30141, -0.58204],
    [0.19962, 0.30921, -0.70471],
    [0.20525, 0.31647, -0.84901],
    [0.21142, 0.32312, -1.0182],
    [0.21807, 0.32909, -1.2168],
    [0.22511, 0.33439, -1.4512],
    [0.23247, 0.33904, -1.7298],
    [0.24010, 0.34308, -2.0637],
    [0.24792, 0.34655, -2.4681],
    [0.25591, 0.34951, -2.9641],
    [0.26400, 0.35200, -3.5814],
    [0.27218, 0.35407, -4.3633],
    [0.28039, 0.35577, -5.3762],
    [0.28863, 0.35714, -6.7262],
    [0.29685, 0.35823, -8.5955],
    [0.30505, 0.35907, -11.324],
    [0.31320, 0.35968, -15.628],
    [0.32129, 0.36011, -23.325],
    [0.32931, 0.36038, -40.770],
    [0.33724, 0.36051, -116.45],
];

/// Mired value of each isotherm in [`ROBERTSON_UVT`].
///
/// The first entry stands in for zero (infinite temperature).
const ROBERTSON_MIRED: [f64; 31] = [
    1.0e-10, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 125.0, 150.0, 175.0,
    200.0, 225.0, 250.0, 275.0, 300.0, 325.0, 350.0, 375.0, 400.0, 425.0, 450.0, 475.0, 500.0,
    525.0, 550.0, 575.0, 600.0,
];

/// Converts a colour temperature in kelvin to mired.
#[inline]
pub fn cct_to_mired(cct: f64) -> f64 {
    1.0e6 / cct
}

/// Converts mired to a colour temperature in kelvin.
#[inline]
pub fn mired_to_cct(mired: f64) -> f64 {
    1.0e6 / mired
}

/// Signed distance from `uv` to the isotherm through `uvt`.
///
/// Positive on the blue (high temperature) side of the isotherm.
pub fn robertson_length(uv: [f64; 2], uvt: [f64; 3]) -> f64 {
    let t = uvt[2];
    let sin = -sign(t) / (1.0 + t * t).sqrt();
    let cos = t * sin;
    let du = uv[0] - uvt[0];
    let dv = uv[1] - uvt[1];
    sin * dv - cos * du
}

/// CIE 1960 uv chromaticity of an XYZ triplet.
#[inline]
pub fn xyz_to_uv(xyz: Vec3) -> [f64; 2] {
    let denom = xyz.x + 15.0 * xyz.y + 3.0 * xyz.z;
    [4.0 * xyz.x / denom, 6.0 * xyz.y / denom]
}

/// xyz chromaticity coordinates of a CIE 1960 uv point.
///
/// The result sums to 1; scale it for a specific luminance.
#[inline]
pub fn uv_to_xyz(uv: [f64; 2]) -> Vec3 {
    let denom = 2.0 * uv[0] - 8.0 * uv[1] + 4.0;
    let x = 3.0 * uv[0] / denom;
    let y = 2.0 * uv[1] / denom;
    Vec3::new(x, y, 1.0 - x - y)
}

/// Estimates the correlated colour temperature of an XYZ triplet.
///
/// The result is clamped to [[`CCT_MIN`], [`CCT_MAX`]].
pub fn xyz_to_color_temperature(xyz: Vec3) -> f64 {
    let uv = xyz_to_uv(xyz);
    let n = ROBERTSON_UVT.len();

    let mut prev = 0.0;
    let mut this = 0.0;
    let mut i = 0;
    while i < n {
        this = robertson_length(uv, ROBERTSON_UVT[i]);
        if this <= 0.0 {
            break;
        }
        prev = this;
        i += 1;
    }

    let mired = if i == 0 {
        ROBERTSON_MIRED[0]
    } else if i >= n {
        ROBERTSON_MIRED[n - 1]
    } else {
        let span = ROBERTSON_MIRED[i] - ROBERTSON_MIRED[i - 1];
        ROBERTSON_MIRED[i - 1] + prev * span / (prev - this)
    };

    let cct = mired_to_cct(mired);
    let clamped = cct.clamp(CCT_MIN, CCT_MAX);
    if clamped != cct {
        trace!(cct, clamped, "colour temperature outside the Robertson table");
    }
    clamped
}

/// Chromaticity (as xyz summing to 1) of a colour temperature.
///
/// Interpolates uv between the two isotherms bracketing the temperature's
/// mired value. Temperatures outside the table use the nearest endpoint.
pub fn color_temperature_to_xyz(cct: f64) -> Vec3 {
    let mired = cct_to_mired(cct);
    let uvt = match ROBERTSON_MIRED.iter().position(|&m| m >= mired) {
        Some(0) => ROBERTSON_UVT[0],
        None => ROBERTSON_UVT[ROBERTSON_UVT.len() - 1],
        Some(i) => {
            let w = (mired - ROBERTSON_MIRED[i - 1]) / (ROBERTSON_MIRED[i] - ROBERTSON_MIRED[i - 1]);
            let hi = ROBERTSON_UVT[i];
            let lo = ROBERTSON_UVT[i - 1];
            [hi[0] * w + lo[0] * (1.0 - w), hi[1] * w + lo[1] * (1.0 - w), 0.0]
        }
    };
    uv_to_xyz([uvt[0], uvt[1]])
}

/// Colour temperature of an EXIF/DNG `LightSource` tag.
///
/// Tags from 32768 up carry the temperature directly (`tag - 32768`).
/// Unknown tags fall back to 5500K daylight.
pub fn light_source_to_color_temp(tag: u16) -> f64 {
    if tag >= 32768 {
        return f64::from(tag - 32768);
    }
    match tag {
        // Unknown, Daylight
        0 | 1 => 5500.0,
        // Fluorescent
        2 => 3500.0,
        // Tungsten
        3 => 3400.0,
        // Cloudy
        10 => 5550.0,
        // Standard light A
        17 => 2856.0,
        // Standard light B
        18 => 4874.0,
        // Standard light C
        19 => 6774.0,
        // D55, D65, D75
        20 => 5500.0,
        21 => 6500.0,
        22 => 7500.0,
        _ => 5500.0,
    }
}

/// Blends two XYZ-to-camera matrices by mired distance.
///
/// The weight `(mired - mired_a) / (mired_b - mired_a)` is clamped to
/// [0, 1]; a target equal to either endpoint returns that endpoint's matrix
/// unchanged. Equal endpoints return `matrix_a`.
pub fn xyz_to_camera_weighted_matrix(
    mired: f64,
    mired_a: f64,
    mired_b: f64,
    matrix_a: &Mat3,
    matrix_b: &Mat3,
) -> Mat3 {
    let w = inverse_lerp(mired_a, mired_b, mired).clamp(0.0, 1.0);
    matrix_a.blend(matrix_b, w)
}
