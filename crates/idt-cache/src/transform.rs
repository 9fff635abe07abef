//! Cached solver entry points.
//!
//! [`TransformCaches`] owns one [`Cache`] per question an image converter
//! asks about a camera:
//!
//! | cache | descriptor | data |
//! |---|---|---|
//! | "WB from illuminant" | make, model, illuminant | multipliers |
//! | "illuminant from WB" | make, model, multipliers | illuminant + multipliers |
//! | "matrix from illuminant" | make, model, illuminant | IDT matrix |
//! | "matrix from DNG metadata" | [`Metadata`] | IDT matrix |
//!
//! On a miss the `fetch_*` methods configure the caller's
//! [`SpectralSolver`] from scratch (camera, training data, observer,
//! illuminant) and run it.

use std::path::PathBuf;

use idt_core::{DataKind, Mat3, Metadata, MetadataSolver, SpectralSolver, Vec3};
use thiserror::Error;
use tracing::info;

use crate::cache::Cache;
use crate::descriptor::{CameraIlluminant, CameraMultipliers, IlluminantMultipliers};

/// Errors from the cached entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// No camera with this make and model in the database.
    #[error("Failed to find spectral data for camera make: '{make}', model: '{model}'. Please check the database search path in IDT_DATABASE_PATH")]
    Camera {
        /// Requested manufacturer.
        make: String,
        /// Requested model.
        model: String,
    },

    /// Training reflectances could not be loaded.
    #[error("Failed to find training data '{0}'. Please check the database search path in IDT_DATABASE_PATH")]
    TrainingData(String),

    /// Observer colour matching functions could not be loaded.
    #[error("Failed to find observer '{0}'. Please check the database search path in IDT_DATABASE_PATH")]
    Observer(String),

    /// Illuminant name is out of range or not in the database.
    #[error("Failed to find illuminant type '{0}'. Please check the database search path in IDT_DATABASE_PATH")]
    Illuminant(String),

    /// No illuminant matched the multipliers.
    #[error("Failed to find illuminant from white balance multipliers")]
    IlluminantFromMultipliers,

    /// Multipliers were not RGB or RGBG.
    #[error("White balance multipliers must have 3 or 4 values, found {0}")]
    MultiplierCount(usize),

    /// White balance computation failed.
    #[error("Failed to calculate white balance multipliers")]
    WhiteBalance,

    /// The spectral IDT fit failed.
    #[error("Failed to calculate IDT matrix from illuminant")]
    MatrixFromIlluminant,

    /// The metadata IDT could not be computed.
    #[error("Failed to calculate IDT matrix from metadata: {0}")]
    MatrixFromMetadata(String),
}

/// Stored result of a cached computation. Failures keep their error so a
/// replay reports the same cause.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T>(pub Result<T, FetchError>);

impl<T: Default> Default for Outcome<T> {
    fn default() -> Self {
        Self(Ok(T::default()))
    }
}

/// Per-call settings for the `fetch_*` methods.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Verbosity applied to the cache; 1 and above logs results.
    pub verbosity: u8,
    /// Bypass and clear the cache.
    pub disable_cache: bool,
    /// Training reflectances, resolved against the database.
    pub training_data: PathBuf,
    /// Observer colour matching functions, resolved against the database.
    pub observer: PathBuf,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            disable_cache: false,
            training_data: PathBuf::from("training/training_spectral.json"),
            observer: PathBuf::from("cmf/cmf_1931.json"),
        }
    }
}

impl FetchOptions {
    fn apply<D, T>(&self, cache: &mut Cache<D, T>) {
        cache.verbosity = self.verbosity;
        cache.disabled = self.disable_cache;
    }
}

/// The four transform caches.
#[derive(Debug, Clone)]
pub struct TransformCaches {
    /// (make, model, illuminant) to multipliers.
    pub wb_from_illuminant: Cache<CameraIlluminant, Outcome<Vec3>>,
    /// (make, model, multipliers) to illuminant.
    pub illuminant_from_wb: Cache<CameraMultipliers, Outcome<IlluminantMultipliers>>,
    /// (make, model, illuminant) to IDT matrix.
    pub matrix_from_illuminant: Cache<CameraIlluminant, Outcome<Mat3>>,
    /// DNG metadata to IDT matrix.
    pub matrix_from_metadata: Cache<Metadata, Outcome<Mat3>>,
}

impl Default for TransformCaches {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformCaches {
    /// Creates empty caches with the default capacity.
    pub fn new() -> Self {
        Self {
            wb_from_illuminant: Cache::new("WB from illuminant"),
            illuminant_from_wb: Cache::new("illuminant from WB"),
            matrix_from_illuminant: Cache::new("matrix from illuminant"),
            matrix_from_metadata: Cache::new("matrix from DNG metadata"),
        }
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.wb_from_illuminant.clear();
        self.illuminant_from_wb.clear();
        self.matrix_from_illuminant.clear();
        self.matrix_from_metadata.clear();
    }

    /// Finds the illuminant whose white balance best matches `wb`.
    ///
    /// `wb` holds RGB or RGBG multipliers as found in raw metadata; see
    /// [`normalize_multipliers`].
    pub fn fetch_illuminant_from_multipliers(
        &mut self,
        make: &str,
        model: &str,
        wb: &[f64],
        solver: &mut SpectralSolver,
        options: &FetchOptions,
    ) -> Result<IlluminantMultipliers, FetchError> {
        let multipliers = normalize_multipliers(wb).ok_or(FetchError::MultiplierCount(wb.len()))?;
        let descriptor = CameraMultipliers {
            make: make.to_string(),
            model: model.to_string(),
            multipliers,
        };

        options.apply(&mut self.illuminant_from_wb);
        let found = fetch(&mut self.illuminant_from_wb, descriptor, || {
            find_camera(solver, make, model)?;
            solver
                .find_illuminant_from_wb(&multipliers.to_array())
                .map_err(|_| FetchError::IlluminantFromMultipliers)?;
            let illuminant = solver
                .illuminant()
                .map(|i| i.type_name.clone())
                .ok_or(FetchError::IlluminantFromMultipliers)?;
            let multipliers = solver
                .wb_multipliers()
                .ok_or(FetchError::IlluminantFromMultipliers)?;
            Ok(IlluminantMultipliers {
                illuminant,
                multipliers,
            })
        })?;

        if options.verbosity > 0 {
            info!("Found illuminant: '{}'.", found.illuminant);
        }
        Ok(found)
    }

    /// White balance multipliers of a camera under a named illuminant.
    pub fn fetch_multipliers_from_illuminant(
        &mut self,
        make: &str,
        model: &str,
        illuminant: &str,
        solver: &mut SpectralSolver,
        options: &FetchOptions,
    ) -> Result<Vec3, FetchError> {
        let descriptor = CameraIlluminant::new(make, model, illuminant);
        let name = descriptor.illuminant.clone();

        options.apply(&mut self.wb_from_illuminant);
        let wb = fetch(&mut self.wb_from_illuminant, descriptor, || {
            find_camera(solver, make, model)?;
            find_illuminant(solver, &name)?;
            solver.calculate_wb().map_err(|_| FetchError::WhiteBalance)
        })?;

        if options.verbosity > 0 {
            info!("White balance coefficients:");
            info!("{} {} {}", wb.x, wb.y, wb.z);
        }
        Ok(wb)
    }

    /// Spectrally fitted IDT matrix of a camera under a named illuminant.
    pub fn fetch_matrix_from_illuminant(
        &mut self,
        make: &str,
        model: &str,
        illuminant: &str,
        solver: &mut SpectralSolver,
        options: &FetchOptions,
    ) -> Result<Mat3, FetchError> {
        let descriptor = CameraIlluminant::new(make, model, illuminant);
        let name = descriptor.illuminant.clone();

        options.apply(&mut self.matrix_from_illuminant);
        let matrix = fetch(&mut self.matrix_from_illuminant, descriptor, || {
            find_camera(solver, make, model)?;
            solver
                .load_spectral_data(&options.training_data, DataKind::Training)
                .map_err(|_| FetchError::TrainingData(options.training_data.display().to_string()))?;
            solver
                .load_spectral_data(&options.observer, DataKind::Cmf)
                .map_err(|_| FetchError::Observer(options.observer.display().to_string()))?;
            find_illuminant(solver, &name)?;
            solver.calculate_wb().map_err(|_| FetchError::WhiteBalance)?;
            solver
                .calculate_idt_matrix()
                .map_err(|_| FetchError::MatrixFromIlluminant)
        })?;

        if options.verbosity > 0 {
            log_matrix(&matrix);
        }
        Ok(matrix)
    }

    /// IDT matrix derived from DNG colour metadata.
    pub fn fetch_matrix_from_metadata(
        &mut self,
        metadata: &Metadata,
        options: &FetchOptions,
    ) -> Result<Mat3, FetchError> {
        options.apply(&mut self.matrix_from_metadata);
        let matrix = fetch(&mut self.matrix_from_metadata, metadata.clone(), || {
            MetadataSolver::new(metadata)
                .calculate_idt_matrix()
                .map_err(|e| FetchError::MatrixFromMetadata(e.to_string()))
        })?;

        if options.verbosity > 0 {
            log_matrix(&matrix);
        }
        Ok(matrix)
    }
}

/// Reduces raw multipliers to normalized RGB.
///
/// Four values are RGBG; the two greens are averaged. The result is
/// divided by its smallest component when that is positive and not
/// already 1. Returns `None` for any other length.
pub fn normalize_multipliers(wb: &[f64]) -> Option<Vec3> {
    let rgb = match wb {
        &[r, g, b] => Vec3::new(r, g, b),
        &[r, g, b, g2] => Vec3::new(r, (g + g2) / 2.0, b),
        _ => return None,
    };
    let min = rgb.min_element();
    if min > 0.0 && min != 1.0 {
        Some(rgb / min)
    } else {
        Some(rgb)
    }
}

/// Runs `compute` through `cache`. A replayed failure returns the error the
/// first attempt produced.
fn fetch<D, T, F>(cache: &mut Cache<D, Outcome<T>>, descriptor: D, compute: F) -> Result<T, FetchError>
where
    D: PartialEq + std::fmt::Display,
    T: Default + Clone,
    F: FnOnce() -> Result<T, FetchError>,
{
    let (_, outcome) = cache.fetch(descriptor, |out| {
        *out = Outcome(compute());
        out.0.is_ok()
    });
    outcome.0
}

fn find_camera(solver: &mut SpectralSolver, make: &str, model: &str) -> Result<(), FetchError> {
    solver.find_camera(make, model).map_err(|_| FetchError::Camera {
        make: make.to_string(),
        model: model.to_string(),
    })
}

fn find_illuminant(solver: &mut SpectralSolver, name: &str) -> Result<(), FetchError> {
    solver
        .find_illuminant(name)
        .map_err(|_| FetchError::Illuminant(name.to_string()))
}

fn log_matrix(matrix: &Mat3) {
    info!("Input Device Transform (IDT) matrix:");
    for [a, b, c] in matrix.m {
        info!("{a} {b} {c}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_rgb() {
        let wb = normalize_multipliers(&[2.0, 1.0, 1.5]).unwrap();
        assert_eq!(wb, Vec3::new(2.0, 1.0, 1.5));

        let wb = normalize_multipliers(&[1.5, 0.5, 1.0]).unwrap();
        assert_abs_diff_eq!(wb.x, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wb.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wb.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_rgbg() {
        let wb = normalize_multipliers(&[1.5, 1.0, 1.2, 1.0]).unwrap();
        assert_eq!(wb, Vec3::new(1.5, 1.0, 1.2));

        let wb = normalize_multipliers(&[2.0, 1.0, 1.8, 2.0]).unwrap();
        assert_abs_diff_eq!(wb.x, 2.0 / 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wb.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wb.z, 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_keeps_non_positive() {
        assert_eq!(
            normalize_multipliers(&[0.0, 1.0, 2.0]),
            Some(Vec3::new(0.0, 1.0, 2.0))
        );
        assert_eq!(normalize_multipliers(&[1.0, 2.0]), None);
        assert_eq!(normalize_multipliers(&[1.0; 5]), None);
    }

    #[test]
    fn test_cache_names() {
        let caches = TransformCaches::new();
        assert_eq!(caches.wb_from_illuminant.name, "WB from illuminant");
        assert_eq!(caches.illuminant_from_wb.name, "illuminant from WB");
        assert_eq!(caches.matrix_from_illuminant.name, "matrix from illuminant");
        assert_eq!(caches.matrix_from_metadata.name, "matrix from DNG metadata");
    }

    #[test]
    fn test_error_messages() {
        let err = FetchError::Camera {
            make: "a".into(),
            model: "b".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to find spectral data for camera make: 'a', model: 'b'. \
             Please check the database search path in IDT_DATABASE_PATH"
        );
        assert_eq!(
            FetchError::Illuminant("d20".into()).to_string(),
            "Failed to find illuminant type 'd20'. Please check the database search path in IDT_DATABASE_PATH"
        );
    }

    #[test]
    fn test_failed_metadata_replays_cause() {
        let mut metadata = Metadata::default();
        metadata.calibration[0].illuminant = 17;
        let mut caches = TransformCaches::new();
        let options = FetchOptions::default();

        let first = caches.fetch_matrix_from_metadata(&metadata, &options);
        assert!(matches!(first, Err(FetchError::MatrixFromMetadata(_))));

        let second = caches.fetch_matrix_from_metadata(&metadata, &options);
        assert_eq!(second, first);
        assert_eq!(caches.matrix_from_metadata.len(), 1);
    }
}
