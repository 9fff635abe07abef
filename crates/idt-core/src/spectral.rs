//! Spectral IDT solver.
//!
//! Derives white balance multipliers and an IDT matrix from measured data:
//! camera spectral sensitivities, an illuminant, an observer (colour
//! matching functions) and a set of training reflectances.
//!
//! # Pipeline
//!
//! ```text
//! find_camera ──┬── find_illuminant(name) ──┬── calculate_wb ──┬── calculate_idt_matrix
//!               └── find_illuminant_from_wb ┘  (sets WB too)  ┘        ▲
//! load_spectral_data(training) ────────────────────────────────────────┤
//! load_spectral_data(observer) ────────────────────────────────────────┘
//! ```
//!
//! Each step checks that the data it depends on is loaded and fails with a
//! [`IdtError::Precondition`] naming the missing piece otherwise. Loading new
//! camera or illuminant data discards results derived from the old data.
//!
//! # Fit
//!
//! For every training patch the reference colour is the patch's XYZ under
//! the illuminant, adapted (CAT02) to the ACES white and expressed in Lab.
//! The camera's white balanced response to the same patch is mapped through
//! the candidate matrix into ACES AP0, then to XYZ and Lab. The matrix is
//! fitted by Levenberg-Marquardt over the Lab residuals, starting from
//! identity.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use idt_math::{CAT02, Mat3, Vec3, adapt_matrix};
use idt_primaries::{ACES_AP0, aces_white_xyz, rgb_to_xyz_matrix};
use tracing::{debug, error, info, warn};

use crate::database::{DataKind, SpectralDatabase, load_curve};
use crate::error::{IdtError, IdtResult};
use crate::illuminant::{Illuminant, IlluminantKind, builtin_names};
use crate::lab::xyz_to_lab;
use crate::optimize::{LmConfig, LmReport, least_squares};
use crate::spectrum::{Shape, SpectralCurve, Spectrum};

/// Parameterization of the fitted matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Six parameters; every row sums to 1 so camera white maps to ACES
    /// white.
    #[default]
    WhitePreserving,
    /// All nine entries free.
    Free,
}

impl FitMode {
    /// Parameters of the identity matrix.
    pub fn initial_params(self) -> Vec<f64> {
        match self {
            Self::WhitePreserving => vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            Self::Free => Mat3::IDENTITY.to_flat().to_vec(),
        }
    }

    /// Matrix for a parameter vector.
    pub fn matrix(self, p: &[f64]) -> Mat3 {
        match self {
            Self::WhitePreserving => Mat3::from_rows([
                [p[0], p[1], 1.0 - p[0] - p[1]],
                [p[2], p[3], 1.0 - p[2] - p[3]],
                [p[4], p[5], 1.0 - p[4] - p[5]],
            ]),
            Self::Free => Mat3::from_rows([
                [p[0], p[1], p[2]],
                [p[3], p[4], p[5]],
                [p[6], p[7], p[8]],
            ]),
        }
    }
}

/// Solver state for one camera.
#[derive(Debug, Clone)]
pub struct SpectralSolver {
    /// Diagnostic level: 1 reports auto-detection, 2 the solver summary,
    /// 3 optimizer progress.
    pub verbosity: u8,
    /// Matrix parameterization.
    pub fit_mode: FitMode,
    /// Optimizer settings.
    pub lm_config: LmConfig,
    database: SpectralDatabase,
    shape: Shape,
    camera: Option<SpectralCurve>,
    illuminant: Option<Illuminant>,
    observer: Option<SpectralCurve>,
    training: Option<SpectralCurve>,
    wb_multipliers: Option<Vec3>,
    idt_matrix: Option<Mat3>,
}

impl SpectralSolver {
    /// Solver over the given database search paths.
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self::with_database(SpectralDatabase::new(search_paths))
    }

    /// Solver over an existing database.
    pub fn with_database(database: SpectralDatabase) -> Self {
        Self {
            verbosity: 0,
            fit_mode: FitMode::default(),
            lm_config: LmConfig::default(),
            database,
            shape: Shape::DEFAULT,
            camera: None,
            illuminant: None,
            observer: None,
            training: None,
            wb_multipliers: None,
            idt_matrix: None,
        }
    }

    /// The database this solver reads from.
    pub fn database(&self) -> &SpectralDatabase {
        &self.database
    }

    /// Loaded camera sensitivities.
    pub fn camera(&self) -> Option<&SpectralCurve> {
        self.camera.as_ref()
    }

    /// Current illuminant.
    pub fn illuminant(&self) -> Option<&Illuminant> {
        self.illuminant.as_ref()
    }

    /// Last computed white balance multipliers.
    pub fn wb_multipliers(&self) -> Option<Vec3> {
        self.wb_multipliers
    }

    /// Last fitted IDT matrix.
    pub fn idt_matrix(&self) -> Option<Mat3> {
        self.idt_matrix
    }

    /// Loads a data file into the slot for `kind`.
    ///
    /// Relative paths resolve against the database search paths; absolute
    /// paths are used directly. The curve is resampled onto the working grid.
    pub fn load_spectral_data(&mut self, path: impl AsRef<Path>, kind: DataKind) -> IdtResult<()> {
        self.load_spectral_data_impl(path.as_ref(), kind)
            .inspect_err(|e| error!("{e}"))
    }

    fn load_spectral_data_impl(&mut self, path: &Path, kind: DataKind) -> IdtResult<()> {
        let resolved = self.database.resolve(path).ok_or_else(|| {
            IdtError::config(format!("Failed to find spectral data '{}'.", path.display()))
        })?;
        let curve = load_curve(&resolved, &self.shape)?;
        debug!(path = %resolved.display(), channels = curve.channel_count(), "loaded spectral data");

        match kind {
            DataKind::Camera => self.set_camera(curve),
            DataKind::Cmf => {
                if curve.channel_count() != 3 {
                    return Err(IdtError::config(format!(
                        "Observer '{}' must have X, Y and Z channels, found {}.",
                        path.display(),
                        curve.channel_count()
                    )));
                }
                self.observer = Some(curve);
                self.idt_matrix = None;
            }
            DataKind::Training => {
                if curve.channel_count() < 2 {
                    return Err(IdtError::config(format!(
                        "Training data '{}' must have at least 2 patches, found {}.",
                        path.display(),
                        curve.channel_count()
                    )));
                }
                self.training = Some(curve);
                self.idt_matrix = None;
            }
            DataKind::Illuminant => {
                let type_name = match curve.header.illuminant_type() {
                    Some(t) => t.to_string(),
                    None => file_stem(&resolved),
                };
                let illuminant = Illuminant::from_curve(&type_name, &curve)?;
                self.set_illuminant(illuminant);
            }
        }
        Ok(())
    }

    /// Loads the sensitivities of a camera from the database.
    ///
    /// Make and model match case-insensitively.
    pub fn find_camera(&mut self, make: &str, model: &str) -> IdtResult<()> {
        self.find_camera_impl(make, model).inspect_err(|e| error!("{e}"))
    }

    fn find_camera_impl(&mut self, make: &str, model: &str) -> IdtResult<()> {
        let (path, file) = self.database.find_camera(make, model).ok_or_else(|| {
            IdtError::config(format!(
                "Failed to find spectral data for camera make: '{make}', model: '{model}'."
            ))
        })?;
        let curve = file
            .to_curve()
            .map_err(|e| IdtError::config(format!("{}: {e}", path.display())))?;
        self.set_camera(curve.reshaped(&self.shape));
        Ok(())
    }

    /// Resolves an illuminant by name.
    ///
    /// Daylight (`D65`, `d6500`) and blackbody (`3200K`) names are
    /// synthesized; anything else is looked up in the database by type.
    pub fn find_illuminant(&mut self, name: &str) -> IdtResult<()> {
        self.find_illuminant_impl(name).inspect_err(|e| error!("{e}"))
    }

    fn find_illuminant_impl(&mut self, name: &str) -> IdtResult<()> {
        let kind = IlluminantKind::parse(name)?;
        let illuminant = self.resolve_illuminant(name, &kind)?;
        self.set_illuminant(illuminant);
        Ok(())
    }

    fn resolve_illuminant(&self, name: &str, kind: &IlluminantKind) -> IdtResult<Illuminant> {
        if let Some(illuminant) = Illuminant::synthesize(name, kind, &self.shape) {
            return Ok(illuminant);
        }
        let lower = name.trim().to_ascii_lowercase();
        let not_found = || IdtError::config(format!("Failed to find illuminant type = '{lower}'."));
        let (_, file) = self.database.find_illuminant(&lower).ok_or_else(not_found)?;
        let curve = file.to_curve()?.reshaped(&self.shape);
        Illuminant::from_curve(&lower, &curve)
    }

    /// Picks the illuminant whose white balance best matches `wb`.
    ///
    /// Candidates are every illuminant in the database plus the built-in
    /// daylight and blackbody series. The winner and its white balance
    /// become the solver's illuminant and multipliers.
    pub fn find_illuminant_from_wb(&mut self, wb: &[f64]) -> IdtResult<()> {
        self.find_illuminant_from_wb_impl(wb)
            .inspect_err(|e| error!("{e}"))
    }

    fn find_illuminant_from_wb_impl(&mut self, wb: &[f64]) -> IdtResult<()> {
        const STEP: &str = "find_illuminant";
        let camera = self.camera_channels(STEP)?;
        let target = Vec3::from_slice(wb).filter(|_| wb.len() == 3).ok_or_else(|| {
            IdtError::config(format!(
                "White balance multipliers must have 3 values, found {}.",
                wb.len()
            ))
        })?;
        if !target.is_finite() || target.min_element() <= 0.0 {
            return Err(IdtError::config(format!(
                "White balance multipliers must be finite and positive, found ({}, {}, {}).",
                target.x, target.y, target.z
            )));
        }

        let mut best: Option<(f64, Illuminant, Vec3)> = None;
        for candidate in self.illuminant_candidates() {
            let Ok(balance) = white_balance(&camera, &candidate) else {
                continue;
            };
            let score = wb_distance(balance.multipliers, target);
            if score.is_nan() {
                continue;
            }
            if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
                best = Some((score, balance.illuminant, balance.multipliers));
            }
        }

        let (score, illuminant, multipliers) = best.ok_or_else(|| {
            IdtError::config("No illuminant candidates produced a valid white balance.")
        })?;
        debug!(illuminant = %illuminant.type_name, score, "illuminant detected");
        if self.verbosity > 0 {
            info!(
                "The illuminant calculated to be the best match to the camera metadata is '{}'.",
                illuminant.type_name
            );
        }
        self.set_illuminant(illuminant);
        self.wb_multipliers = Some(multipliers);
        Ok(())
    }

    /// Database illuminants followed by the built-in series.
    fn illuminant_candidates(&self) -> Vec<Illuminant> {
        let mut out = Vec::new();
        for (path, file) in self.database.scan(DataKind::Illuminant) {
            let type_name = match file.header.illuminant_type() {
                Some(t) => t.to_string(),
                None => file_stem(&path),
            };
            match file
                .to_curve()
                .and_then(|c| Illuminant::from_curve(&type_name, &c.reshaped(&self.shape)))
            {
                Ok(illuminant) => out.push(illuminant),
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }
        out.extend(builtin_names().iter().filter_map(|name| {
            let kind = IlluminantKind::parse(name).ok()?;
            Illuminant::synthesize(name, &kind, &self.shape)
        }));
        out
    }

    /// Computes white balance multipliers for the current camera and
    /// illuminant, normalized so green is 1.
    pub fn calculate_wb(&mut self) -> IdtResult<Vec3> {
        self.calculate_wb_impl().inspect_err(|e| error!("{e}"))
    }

    fn calculate_wb_impl(&mut self) -> IdtResult<Vec3> {
        const STEP: &str = "calculate_WB";
        let camera = self.camera_channels(STEP)?;
        let illuminant = require(&self.illuminant, STEP, "illuminant")?;
        let balance = white_balance(&camera, illuminant)?;
        let multipliers = balance.multipliers;
        self.illuminant = Some(balance.illuminant);
        self.wb_multipliers = Some(multipliers);
        self.idt_matrix = None;
        Ok(multipliers)
    }

    /// Fits the IDT matrix from camera RGB to ACES AP0.
    pub fn calculate_idt_matrix(&mut self) -> IdtResult<Mat3> {
        self.calculate_idt_matrix_impl()
            .inspect_err(|e| error!("{e}"))
    }

    fn calculate_idt_matrix_impl(&mut self) -> IdtResult<Mat3> {
        const STEP: &str = "calculate_IDT_matrix";
        let camera = self.camera_channels(STEP)?;
        let illuminant = require(&self.illuminant, STEP, "illuminant")?;
        let observer = require(&self.observer, STEP, "observer")?;
        let training = require(&self.training, STEP, "training data")?;
        let wb = *require(&self.wb_multipliers, STEP, "white balance")?;

        let observer = three_channels(observer).ok_or(IdtError::Precondition {
            step: STEP,
            requires: "observer",
        })?;
        let balance = white_balance(&camera, illuminant)?;
        let samples = training_samples(&camera, &observer, training, &balance, wb)?;

        let fit_mode = self.fit_mode;
        let ap0_to_xyz = rgb_to_xyz_matrix(&ACES_AP0);
        let aces_white = aces_white_xyz();
        let residuals = |p: &[f64]| {
            let b = fit_mode.matrix(p);
            let mut out = Vec::with_capacity(samples.len() * 3);
            for (lab_ref, rgb) in &samples {
                let lab = xyz_to_lab(ap0_to_xyz * (b * *rgb), aces_white);
                let d = *lab_ref - lab;
                out.extend_from_slice(&d.to_array());
            }
            out
        };

        let config = LmConfig {
            log_progress: self.verbosity >= 3,
            ..self.lm_config.clone()
        };
        let report = least_squares(residuals, &fit_mode.initial_params(), &config)?;
        let matrix = fit_mode.matrix(&report.params);

        if self.verbosity >= 2 {
            log_summary(&report, &matrix);
        }
        self.idt_matrix = Some(matrix);
        Ok(matrix)
    }

    /// "make / model" of every camera in the database, sorted.
    pub fn list_cameras(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .database
            .scan(DataKind::Camera)
            .into_iter()
            .filter_map(|(_, file)| {
                let make = file.header.manufacturer?;
                let model = file.header.model?;
                Some(format!("{make} / {model}"))
            })
            .collect();
        names.into_iter().collect()
    }

    /// Supported illuminants: the two synthesized families, then every
    /// database type.
    pub fn list_illuminants(&self) -> Vec<String> {
        let mut out = vec![
            "Day-light (e.g., D60, D6025)".to_string(),
            "Blackbody (e.g., 3200K)".to_string(),
        ];
        let types: BTreeSet<String> = self
            .database
            .scan(DataKind::Illuminant)
            .into_iter()
            .filter_map(|(_, file)| file.header.illuminant_type().map(str::to_string))
            .collect();
        out.extend(types);
        out
    }

    fn set_camera(&mut self, curve: SpectralCurve) {
        self.camera = Some(curve);
        self.wb_multipliers = None;
        self.idt_matrix = None;
    }

    fn set_illuminant(&mut self, illuminant: Illuminant) {
        self.illuminant = Some(illuminant);
        self.wb_multipliers = None;
        self.idt_matrix = None;
    }

    /// Camera R/G/B channels; a camera with any other channel count counts
    /// as not loaded.
    fn camera_channels(&self, step: &'static str) -> IdtResult<[&Spectrum; 3]> {
        self.camera
            .as_ref()
            .and_then(three_channels)
            .ok_or(IdtError::Precondition {
                step,
                requires: "camera",
            })
    }
}

fn require<'a, T>(slot: &'a Option<T>, step: &'static str, requires: &'static str) -> IdtResult<&'a T> {
    slot.as_ref().ok_or(IdtError::Precondition { step, requires })
}

fn three_channels(curve: &SpectralCurve) -> Option<[&Spectrum; 3]> {
    match curve.channels.as_slice() {
        [a, b, c] => Some([&a.spectrum, &b.spectrum, &c.spectrum]),
        _ => None,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Camera response to an illuminant.
struct WhiteBalance {
    /// Illuminant scaled to 1 at the camera's green peak.
    illuminant: Illuminant,
    /// Per-channel integrated response.
    response: Vec3,
    /// `response.g / response`.
    multipliers: Vec3,
}

fn white_balance(camera: &[&Spectrum; 3], illuminant: &Illuminant) -> IdtResult<WhiteBalance> {
    let peak = camera[1].argmax().unwrap_or(0);
    let illuminant = illuminant.normalized_at(peak);
    let mut response = Vec3::ZERO;
    for (i, channel) in camera.iter().enumerate() {
        response[i] = channel.dot(&illuminant.spectrum)?;
    }
    let multipliers = Vec3::splat(response.y).div_elem(response);
    if !multipliers.is_finite() {
        return Err(IdtError::config(format!(
            "Camera response to illuminant '{}' is zero.",
            illuminant.type_name
        )));
    }
    Ok(WhiteBalance {
        illuminant,
        response,
        multipliers,
    })
}

/// Sum of squared ratios between two green-normalized multiplier sets.
fn wb_distance(candidate: Vec3, target: Vec3) -> f64 {
    let c = candidate / candidate.y;
    let t = target / target.y;
    let r = c.div_elem(t) - Vec3::ONE;
    r.dot(r)
}

/// Reference Lab and white balanced camera RGB for every training patch.
fn training_samples(
    camera: &[&Spectrum; 3],
    observer: &[&Spectrum; 3],
    training: &SpectralCurve,
    balance: &WhiteBalance,
    wb: Vec3,
) -> IdtResult<Vec<(Vec3, Vec3)>> {
    let illum = &balance.illuminant.spectrum;
    let y_norm = observer[1].dot(illum)?;
    let illum_white = Vec3::new(observer[0].dot(illum)?, y_norm, observer[2].dot(illum)?) / y_norm;
    let aces_white = aces_white_xyz();
    let cat = adapt_matrix(CAT02, illum_white, aces_white);

    let mut samples = Vec::with_capacity(training.channel_count());
    for patch in &training.channels {
        let lit = patch.spectrum.product(illum)?;
        let mut xyz = Vec3::ZERO;
        let mut rgb = Vec3::ZERO;
        for i in 0..3 {
            xyz[i] = observer[i].dot(&lit)? / y_norm;
            rgb[i] = camera[i].dot(&lit)? * wb[i] / balance.response.y;
        }
        samples.push((xyz_to_lab(cat * xyz, aces_white), rgb));
    }
    Ok(samples)
}

fn log_summary(report: &LmReport, matrix: &Mat3) {
    info!("Solver Summary");
    info!("  iterations:   {}", report.iterations);
    info!("  initial cost: {:.6e}", report.initial_cost);
    info!("  final cost:   {:.6e}", report.final_cost);
    info!("  termination:  {}", report.termination);
    info!("The IDT matrix is");
    for i in 0..3 {
        let r = matrix.row(i);
        info!("  {:.9} {:.9} {:.9}", r.x, r.y, r.z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp_curve(names: &[&str]) -> SpectralCurve {
        SpectralCurve::from_channels(
            Default::default(),
            names.iter().enumerate().map(|(i, n)| {
                let base = 0.1 * (i + 1) as f64;
                (
                    n.to_string(),
                    Spectrum::from_fn(Shape::DEFAULT, |wl| base + (wl - 380.0) * 0.001),
                )
            }),
        )
    }

    fn loaded_solver() -> SpectralSolver {
        let mut solver = SpectralSolver::new(Vec::new());
        solver.set_camera(ramp_curve(&["R", "G", "B"]));
        solver.observer = Some(ramp_curve(&["X", "Y", "Z"]));
        solver.training = Some(ramp_curve(&["patch1", "patch2", "patch3"]));
        solver
    }

    #[test]
    fn test_fit_mode_params() {
        let m = FitMode::WhitePreserving.matrix(&FitMode::WhitePreserving.initial_params());
        assert_eq!(m, Mat3::IDENTITY);
        let m = FitMode::Free.matrix(&FitMode::Free.initial_params());
        assert_eq!(m, Mat3::IDENTITY);
        let m = FitMode::WhitePreserving.matrix(&[0.5, 0.2, 0.1, 0.7, -0.2, 0.3]);
        assert_abs_diff_eq!(m.row_sums().x, 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(m.row_sums().z, 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_wb_distance() {
        let a = Vec3::new(2.0, 1.0, 1.5);
        assert_eq!(wb_distance(a, a), 0.0);
        assert_eq!(wb_distance(a * 3.0, a), 0.0);
        assert!(wb_distance(Vec3::new(2.0, 1.0, 1.0), a) > 0.0);
    }

    #[test]
    fn test_preconditions() {
        let mut solver = SpectralSolver::new(Vec::new());
        let err = solver.calculate_wb().unwrap_err();
        assert_eq!(
            err.to_string(),
            "camera needs to be initialised prior to calling SpectralSolver::calculate_WB()"
        );

        solver.set_camera(ramp_curve(&["R", "G", "B"]));
        let err = solver.calculate_wb().unwrap_err();
        assert_eq!(
            err.to_string(),
            "illuminant needs to be initialised prior to calling SpectralSolver::calculate_WB()"
        );

        solver.find_illuminant("d65").unwrap();
        let err = solver.calculate_idt_matrix().unwrap_err();
        assert_eq!(
            err.to_string(),
            "observer needs to be initialised prior to calling SpectralSolver::calculate_IDT_matrix()"
        );

        solver.observer = Some(ramp_curve(&["X", "Y", "Z"]));
        let err = solver.calculate_idt_matrix().unwrap_err();
        assert!(err.to_string().starts_with("training data needs"));

        solver.training = Some(ramp_curve(&["a", "b"]));
        let err = solver.calculate_idt_matrix().unwrap_err();
        assert!(err.to_string().starts_with("white balance needs"));
    }

    #[test]
    fn test_wrong_channel_count_is_uninitialised() {
        let mut solver = SpectralSolver::new(Vec::new());
        solver.set_camera(ramp_curve(&["R", "G", "B", "G2"]));
        let err = solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "camera needs to be initialised prior to calling SpectralSolver::find_illuminant()"
        );
    }

    #[test]
    fn test_wb_green_is_one() {
        let mut solver = loaded_solver();
        solver.find_illuminant("3200K").unwrap();
        let wb = solver.calculate_wb().unwrap();
        assert_eq!(wb.y, 1.0);
        // Red has the smallest response on the ramp camera.
        assert!(wb.x > 1.0 && wb.z < 1.0);
        assert_eq!(solver.wb_multipliers(), Some(wb));
    }

    #[test]
    fn test_new_illuminant_discards_results() {
        let mut solver = loaded_solver();
        solver.find_illuminant("d65").unwrap();
        solver.calculate_wb().unwrap();
        solver.find_illuminant("d50").unwrap();
        assert!(solver.wb_multipliers().is_none());
    }

    #[test]
    fn test_idt_rows_sum_to_one() {
        let mut solver = loaded_solver();
        solver.find_illuminant("d65").unwrap();
        solver.calculate_wb().unwrap();
        let idt = solver.calculate_idt_matrix().unwrap();
        for i in 0..3 {
            assert_abs_diff_eq!(idt.row_sums()[i], 1.0, epsilon = 1e-9);
        }
        assert_eq!(solver.idt_matrix(), Some(idt));
    }

    /// Gaussian stand-ins for the 1931 observer.
    fn observer_xyz(wl: f64) -> Vec3 {
        let g = |mu: f64, sigma: f64| (-0.5 * ((wl - mu) / sigma).powi(2)).exp();
        Vec3::new(
            1.06 * g(600.0, 38.0) + 0.36 * g(446.0, 19.0),
            g(556.0, 46.0),
            1.78 * g(449.0, 22.0),
        )
    }

    fn curve_from(names: [&str; 3], f: impl Fn(f64) -> Vec3) -> SpectralCurve {
        SpectralCurve::from_channels(
            Default::default(),
            names.iter().enumerate().map(|(i, n)| {
                (n.to_string(), Spectrum::from_fn(Shape::DEFAULT, |wl| f(wl)[i]))
            }),
        )
    }

    /// Smooth reflectances, no two alike.
    fn training_patches(count: usize) -> SpectralCurve {
        SpectralCurve::from_channels(
            Default::default(),
            (0..count).map(|k| {
                let freq = 0.5 + 0.25 * (k % 5) as f64;
                let phase = 0.9 * k as f64;
                let depth = 0.2 + 0.01 * k as f64;
                let spectrum = Spectrum::from_fn(Shape::DEFAULT, |wl| {
                    let t = std::f64::consts::TAU * freq * (wl - 380.0) / 400.0;
                    0.5 + depth * (t + phase).sin()
                });
                (format!("patch{}", k + 1), spectrum)
            }),
        )
    }

    /// Camera whose sensitivities are a linear mix of the observer, so an
    /// exact IDT exists.
    fn mixed_camera_solver(fit_mode: FitMode) -> SpectralSolver {
        let k = Mat3::from_rows([[0.9, 0.3, -0.1], [0.1, 1.0, 0.05], [0.0, 0.15, 0.9]]);
        let mut solver = SpectralSolver::new(Vec::new());
        solver.fit_mode = fit_mode;
        solver.set_camera(curve_from(["R", "G", "B"], |wl| k * observer_xyz(wl)));
        solver.observer = Some(curve_from(["X", "Y", "Z"], observer_xyz));
        solver.training = Some(training_patches(24));
        solver.find_illuminant("d65").unwrap();
        solver.calculate_wb().unwrap();
        solver
    }

    /// Largest ACES AP0 error of `idt` over the training patches.
    fn worst_aces_error(solver: &SpectralSolver, idt: Mat3) -> f64 {
        let camera = solver.camera_channels("test").unwrap();
        let observer = three_channels(solver.observer.as_ref().unwrap()).unwrap();
        let illum = &solver.illuminant().unwrap().spectrum;
        let wb = solver.wb_multipliers().unwrap();

        let green = camera[1].dot(illum).unwrap();
        let y_norm = observer[1].dot(illum).unwrap();
        let white = Vec3::new(
            observer[0].dot(illum).unwrap(),
            y_norm,
            observer[2].dot(illum).unwrap(),
        ) / y_norm;
        let to_aces = idt_primaries::xyz_to_rgb_matrix(&ACES_AP0)
            * adapt_matrix(CAT02, white, aces_white_xyz());

        let mut worst = 0.0_f64;
        for patch in &solver.training.as_ref().unwrap().channels {
            let lit = patch.spectrum.product(illum).unwrap();
            let mut rgb = Vec3::ZERO;
            let mut xyz = Vec3::ZERO;
            for i in 0..3 {
                rgb[i] = camera[i].dot(&lit).unwrap() * wb[i] / green;
                xyz[i] = observer[i].dot(&lit).unwrap() / y_norm;
            }
            let d = idt * rgb - to_aces * xyz;
            worst = worst.max(d.x.abs()).max(d.y.abs()).max(d.z.abs());
        }
        worst
    }

    #[test]
    fn test_free_fit_recovers_exact_idt() {
        let mut solver = mixed_camera_solver(FitMode::Free);
        let idt = solver.calculate_idt_matrix().unwrap();
        assert!(worst_aces_error(&solver, idt) < 1e-6);
        // The exact solution maps camera white to ACES white.
        for i in 0..3 {
            assert_abs_diff_eq!(idt.row_sums()[i], 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_white_preserving_fit_recovers_exact_idt() {
        let mut solver = mixed_camera_solver(FitMode::WhitePreserving);
        let idt = solver.calculate_idt_matrix().unwrap();
        assert!(worst_aces_error(&solver, idt) < 1e-6);

        let mut free = mixed_camera_solver(FitMode::Free);
        let free_idt = free.calculate_idt_matrix().unwrap();
        assert!(idt.max_abs_diff(&free_idt) < 1e-6);
    }

    #[test]
    fn test_identity_is_not_a_fit() {
        let solver = mixed_camera_solver(FitMode::Free);
        assert!(worst_aces_error(&solver, Mat3::IDENTITY) > 1e-2);
    }

    #[test]
    fn test_auto_detect_builtin() {
        let mut solver = loaded_solver();
        solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]).unwrap();
        assert_eq!(solver.illuminant().unwrap().type_name, "2000k");
        assert!(solver.wb_multipliers().is_some());

        solver.find_illuminant_from_wb(&[2.0 / 1.5, 1.0, 1.8 / 1.5]).unwrap();
        assert_eq!(solver.illuminant().unwrap().type_name, "1500k");
    }

    #[test]
    fn test_degenerate_multipliers_rejected() {
        let mut solver = loaded_solver();
        for wb in [[1.5, 0.0, 1.2], [-1.0, 1.0, 1.2], [f64::NAN, 1.0, 1.2], [f64::INFINITY, 1.0, 1.0]] {
            let err = solver.find_illuminant_from_wb(&wb).unwrap_err();
            assert!(err.is_config(), "{wb:?}");
            assert!(err.to_string().starts_with("White balance multipliers must be finite"));
        }
        assert!(solver.illuminant().is_none());
    }

    #[test]
    fn test_unknown_named_illuminant() {
        let mut solver = SpectralSolver::new(Vec::new());
        let err = solver.find_illuminant("Studio").unwrap_err();
        assert_eq!(err.to_string(), "Failed to find illuminant type = 'studio'.");
    }
}
