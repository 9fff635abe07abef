//! DNG metadata solver.
//!
//! Builds an IDT from the colour calibration a raw file carries instead of
//! from spectral measurements. A DNG stores two calibrations, each an
//! EXIF `LightSource` tag and the XYZ-to-camera matrix measured under that
//! light, plus the camera response to the scene's neutral (`AsShotNeutral`).
//!
//! # Algorithm
//!
//! 1. Search the mired range spanned by the two calibration illuminants for
//!    the temperature at which the blended XYZ-to-camera matrix maps the
//!    neutral to a white of that same temperature.
//! 2. Invert the blended matrix and scale by `2^baseline_exposure` to get
//!    camera-to-XYZ; the neutral through it is the scene white.
//! 3. CAT: CAT02 adaptation from the scene white to the ACES white.
//! 4. IDT: `XYZ->AP0 * Bradford(D65 -> ACES white) * CAT`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use idt_core::metadata::{Metadata, MetadataSolver};
//!
//! let metadata: Metadata = serde_json::from_str(&std::fs::read_to_string("shot.json")?)?;
//! let solver = MetadataSolver::new(&metadata);
//! let idt = solver.calculate_idt_matrix()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use idt_math::{BRADFORD, CAT02, D65, Mat3, Vec3, adapt_matrix};
use idt_primaries::{ACES_AP0, aces_white_xyz, xyz_to_rgb_matrix};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{IdtError, IdtResult};
use crate::temperature::{
    CCT_MAX, CCT_MIN, color_temperature_to_xyz, cct_to_mired, light_source_to_color_temp,
    xyz_to_camera_weighted_matrix, xyz_to_color_temperature,
};

const NO_NEUTRAL: &str = "No neutral RGB values were found.";
const NO_ILLUMINANTS: &str = "No calibration illuminants were found.";

/// One DNG colour calibration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// EXIF `LightSource` tag; 0 means the calibration is absent.
    pub illuminant: u16,
    /// `CameraCalibration`, row-major.
    pub camera_calibration_matrix: [f64; 9],
    /// `ColorMatrix`: XYZ to camera RGB, row-major.
    pub xyz_to_rgb_matrix: [f64; 9],
}

/// Colour metadata of one raw file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// The two calibrations.
    pub calibration: [Calibration; 2],
    /// Camera response to the scene neutral; empty if unknown.
    #[serde(default)]
    pub neutral_rgb: Vec<f64>,
    /// Exposure offset in stops.
    #[serde(default)]
    pub baseline_exposure: f64,
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<Metadata>")
    }
}

/// Solver over borrowed metadata.
#[derive(Debug, Clone, Copy)]
pub struct MetadataSolver<'a> {
    metadata: &'a Metadata,
}

impl<'a> MetadataSolver<'a> {
    /// Creates a solver for `metadata`.
    pub fn new(metadata: &'a Metadata) -> Self {
        Self { metadata }
    }

    /// The metadata being solved.
    pub fn metadata(&self) -> &'a Metadata {
        self.metadata
    }

    /// Chromatic adaptation from the scene white to the ACES white.
    pub fn calculate_cat_matrix(&self) -> IdtResult<Mat3> {
        let (_, white) = camera_xyz_matrix_and_white_point(self.metadata)?;
        Ok(adapt_matrix(CAT02, white, aces_white_xyz()))
    }

    /// IDT from camera-derived XYZ to ACES AP0.
    pub fn calculate_idt_matrix(&self) -> IdtResult<Mat3> {
        let cat = self.calculate_cat_matrix()?;
        let d65_to_aces = adapt_matrix(BRADFORD, D65, aces_white_xyz());
        Ok(xyz_to_rgb_matrix(&ACES_AP0) * d65_to_aces * cat)
    }
}

/// Why the calibration matrices could not be blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fallback {
    NoIlluminants,
    NoNeutral,
}

impl Fallback {
    fn message(self) -> &'static str {
        match self {
            Self::NoIlluminants => NO_ILLUMINANTS,
            Self::NoNeutral => NO_NEUTRAL,
        }
    }
}

fn neutral_vec(neutral: &[f64]) -> Option<Vec3> {
    Vec3::from_slice(neutral)
}

/// XYZ-to-camera matrix matching the scene neutral.
///
/// When only calibration 0 carries an illuminant its matrix is returned
/// as-is. When calibration 0 has no illuminant, or there is no neutral,
/// logs a warning and returns calibration 0's matrix.
pub fn find_xyz_to_camera_matrix(metadata: &Metadata, neutral: &[f64]) -> Mat3 {
    let (matrix, fallback) = select_xyz_to_camera(metadata, neutral);
    if let Some(fallback) = fallback {
        warn!("{}", fallback.message());
    }
    matrix
}

fn select_xyz_to_camera(metadata: &Metadata, neutral: &[f64]) -> (Mat3, Option<Fallback>) {
    let [c0, c1] = &metadata.calibration;
    let m0 = Mat3::from_flat(c0.xyz_to_rgb_matrix);
    let m1 = Mat3::from_flat(c1.xyz_to_rgb_matrix);

    if c0.illuminant == 0 {
        return (m0, Some(Fallback::NoIlluminants));
    }
    if c1.illuminant == 0 {
        return (m0, None);
    }
    let Some(neutral) = neutral_vec(neutral) else {
        return (m0, Some(Fallback::NoNeutral));
    };

    let mired0 = cct_to_mired(light_source_to_color_temp(c0.illuminant));
    let mired1 = cct_to_mired(light_source_to_color_temp(c1.illuminant));
    let mired = search_mired(&m0, &m1, mired0, mired1, neutral);
    (xyz_to_camera_weighted_matrix(mired, mired0, mired1, &m0, &m1), None)
}

/// Scans the calibration mired span for the temperature consistent with
/// the neutral, refining a bracketed crossing.
fn search_mired(m0: &Mat3, m1: &Mat3, mired0: f64, mired1: f64, neutral: Vec3) -> f64 {
    let table_lo = cct_to_mired(CCT_MAX);
    let table_hi = cct_to_mired(CCT_MIN);
    let lo = mired0.min(mired1).clamp(table_lo, table_hi);
    let hi = mired0.max(mired1).clamp(table_lo, table_hi);
    let step = ((hi - lo) / 50.0).max(5.0);

    let mut estimate = lo;
    let mut smallest = 0.0_f64;
    let mut last_diff = 0.0;
    let mut last_mired = lo;
    let mut mired = lo;
    while mired < hi {
        let blended = xyz_to_camera_weighted_matrix(mired, mired0, mired1, m0, m1);
        let Some(camera_to_xyz) = blended.inverse() else {
            trace!(mired, "skipping singular blended matrix");
            mired += step;
            continue;
        };
        let cct = xyz_to_color_temperature(camera_to_xyz * neutral);
        let diff = mired - cct_to_mired(cct);

        if diff.abs() <= 1e-9 {
            return mired;
        }
        let first = (mired - lo).abs() <= 1e-9;
        if !first && diff * last_diff <= 0.0 {
            return mired + diff / (diff - last_diff) * (mired - last_mired);
        }
        if first || diff.abs() < smallest.abs() {
            estimate = mired;
            smallest = diff;
        }
        last_diff = diff;
        last_mired = mired;
        mired += step;
    }
    estimate
}

/// Camera-to-XYZ matrix and the scene white point (Y = 1).
///
/// Without a neutral, the white point is the chromaticity of calibration
/// 0's illuminant.
pub fn camera_xyz_matrix_and_white_point(metadata: &Metadata) -> IdtResult<(Mat3, Vec3)> {
    let neutral = neutral_vec(&metadata.neutral_rgb);
    let (xyz_to_camera, fallback) = select_xyz_to_camera(metadata, &metadata.neutral_rgb);
    if let Some(fallback) = fallback.filter(|f| *f != Fallback::NoNeutral) {
        warn!("{}", fallback.message());
    }

    let camera_to_xyz = xyz_to_camera
        .inverse()
        .ok_or(IdtError::Singular("XYZ to camera matrix"))?
        * 2.0_f64.powf(metadata.baseline_exposure);

    let white = match neutral {
        Some(neutral) => camera_to_xyz * neutral,
        None => {
            warn!("{NO_NEUTRAL}");
            let cct = light_source_to_color_temp(metadata.calibration[0].illuminant);
            color_temperature_to_xyz(cct)
        }
    };
    if white.y == 0.0 || !white.is_finite() {
        return Err(IdtError::Singular("camera white point"));
    }
    Ok((camera_to_xyz, white / white.y))
}
