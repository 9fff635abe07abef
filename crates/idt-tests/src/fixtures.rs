//! Temporary spectral databases.
//!
//! ```rust
//! use idt_tests::fixtures::TestDatabase;
//!
//! let db = TestDatabase::standard().unwrap();
//! let mut solver = db.solver();
//! solver.find_camera(TestDatabase::MAKE, TestDatabase::MODEL).unwrap();
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use idt_core::{
    DataKind, Header, IdtError, IdtResult, Shape, SpectralCurve, SpectralFile, SpectralSolver,
    Spectrum,
};
use tempfile::TempDir;

/// Relative path of the training data.
pub const TRAINING_PATH: &str = "training/training_spectral.json";

/// Relative path of the observer.
pub const OBSERVER_PATH: &str = "cmf/cmf_1931.json";

/// Curve whose channel `i` is `0.1 * (i + 1) + (wl - 380) * 0.001`.
pub fn ramp_curve(header: Header, names: &[&str]) -> SpectralCurve {
    SpectralCurve::from_channels(
        header,
        names.iter().enumerate().map(|(i, name)| {
            let base = 0.1 * (i + 1) as f64;
            (
                name.to_string(),
                Spectrum::from_fn(Shape::DEFAULT, |wl| base + (wl - 380.0) * 0.001),
            )
        }),
    )
}

/// Illuminant rising linearly from 1.0 at 380nm.
pub fn linear_illuminant(kind: &str, channels: usize) -> SpectralCurve {
    SpectralCurve::from_channels(
        Header::illuminant(kind),
        (0..channels).map(|i| {
            (
                format!("power{i}"),
                Spectrum::from_fn(Shape::DEFAULT, |wl| 1.0 + (wl - 380.0) * 0.01),
            )
        }),
    )
}

/// A database root in a temporary directory, deleted on drop.
pub struct TestDatabase {
    dir: TempDir,
}

impl TestDatabase {
    /// Manufacturer of the standard camera.
    pub const MAKE: &'static str = "Blackmagic";
    /// Model of the standard camera.
    pub const MODEL: &'static str = "Cinema Camera";

    /// Empty database.
    pub fn new() -> IdtResult<Self> {
        let dir = TempDir::new().map_err(|source| IdtError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Camera, training data, observer and a `linear` illuminant.
    pub fn standard() -> IdtResult<Self> {
        Self::new()?
            .with_camera(Self::MAKE, Self::MODEL, &["R", "G", "B"])?
            .with_training()?
            .with_observer()?
            .with_illuminant("linear", 1)
    }

    /// Adds a ramp camera with the given channels.
    pub fn with_camera(self, make: &str, model: &str, channels: &[&str]) -> IdtResult<Self> {
        let curve = ramp_curve(Header::camera(make, model), channels);
        let name = format!("{}_{}.json", make, model).to_lowercase().replace(' ', "_");
        self.write(DataKind::Camera, &name, &curve)?;
        Ok(self)
    }

    /// Adds three ramp training patches at [`TRAINING_PATH`].
    pub fn with_training(self) -> IdtResult<Self> {
        let curve = ramp_curve(Header::default(), &["patch1", "patch2", "patch3"]);
        self.write(DataKind::Training, "training_spectral.json", &curve)?;
        Ok(self)
    }

    /// Adds a ramp observer at [`OBSERVER_PATH`].
    pub fn with_observer(self) -> IdtResult<Self> {
        let curve = ramp_curve(Header::default(), &["X", "Y", "Z"]);
        self.write(DataKind::Cmf, "cmf_1931.json", &curve)?;
        Ok(self)
    }

    /// Adds a linear illuminant. More than one channel makes it invalid.
    pub fn with_illuminant(self, kind: &str, channels: usize) -> IdtResult<Self> {
        let curve = linear_illuminant(kind, channels);
        self.write(DataKind::Illuminant, &format!("{kind}.json"), &curve)?;
        Ok(self)
    }

    /// Writes a curve under the directory for `kind`.
    pub fn write(&self, kind: DataKind, file_name: &str, curve: &SpectralCurve) -> IdtResult<PathBuf> {
        let dir = self.root().join(kind.dir_name());
        fs::create_dir_all(&dir).map_err(|source| IdtError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(file_name);
        SpectralFile::from_curve(curve).save(&path)?;
        Ok(path)
    }

    /// Writes raw text under the directory for `kind`.
    pub fn write_raw(&self, kind: DataKind, file_name: &str, text: &str) -> IdtResult<PathBuf> {
        let dir = self.root().join(kind.dir_name());
        fs::create_dir_all(&dir).map_err(|source| IdtError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(file_name);
        fs::write(&path, text).map_err(|source| IdtError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Database root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Search paths containing only this database.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        vec![self.root().to_path_buf()]
    }

    /// Solver over this database.
    pub fn solver(&self) -> SpectralSolver {
        SpectralSolver::new(self.search_paths())
    }

    /// Solver over this database with the standard camera, training data
    /// and observer loaded.
    pub fn loaded_solver(&self) -> IdtResult<SpectralSolver> {
        let mut solver = self.solver();
        solver.find_camera(Self::MAKE, Self::MODEL)?;
        solver.load_spectral_data(TRAINING_PATH, DataKind::Training)?;
        solver.load_spectral_data(OBSERVER_PATH, DataKind::Cmf)?;
        Ok(solver)
    }
}
