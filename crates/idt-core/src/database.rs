//! Spectral database: JSON files and search paths.
//!
//! A database is a directory with one subdirectory per data kind:
//!
//! ```text
//! <root>/camera/       R/G/B sensitivities, header carries manufacturer + model
//! <root>/illuminant/   one power channel, header carries type
//! <root>/training/     one channel per reflectance patch
//! <root>/cmf/          X/Y/Z colour matching functions
//! ```
//!
//! Every file has the same layout:
//!
//! ```json
//! { "header": { "manufacturer": "...", "model": "...", "schema_version": "1.0.0" },
//!   "spectral_data": { "units": "relative",
//!                      "index": { "main": ["R", "G", "B"] },
//!                      "data": { "main": { "380": [0.1, 0.2, 0.3] } } } }
//! ```
//!
//! Several roots can be configured. Relative paths resolve against them in
//! order, first match wins; directory scans visit all of them.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{IdtError, IdtResult};
use crate::spectrum::{Shape, SpectralCurve, Spectrum};

/// Environment variable holding the database search path list.
pub const DATABASE_PATH_ENV: &str = "IDT_DATABASE_PATH";

/// Search paths used when [`DATABASE_PATH_ENV`] is unset.
pub const DEFAULT_DATABASE_PATHS: [&str; 2] = ["/usr/local/share/idt/data", "/usr/share/idt/data"];

/// Name of the channel set every file stores its data under.
const MAIN_SET: &str = "main";

/// Subdirectory of a database root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Camera spectral sensitivities.
    Camera,
    /// Illuminant spectral power distributions.
    Illuminant,
    /// Training patch reflectances.
    Training,
    /// Observer colour matching functions.
    Cmf,
}

impl DataKind {
    /// Directory name under a database root.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Illuminant => "illuminant",
            Self::Training => "training",
            Self::Cmf => "cmf",
        }
    }
}

/// File header. Every field is optional; which ones matter depends on
/// the data kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Camera manufacturer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    /// Camera model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Illuminant type name.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Legacy spelling of the illuminant type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illuminant: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Version of the file schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
}

impl Header {
    /// Header for a camera file.
    pub fn camera(manufacturer: &str, model: &str) -> Self {
        Self {
            manufacturer: Some(manufacturer.to_string()),
            model: Some(model.to_string()),
            schema_version: Some("1.0.0".to_string()),
            ..Self::default()
        }
    }

    /// Header for an illuminant file.
    pub fn illuminant(kind: &str) -> Self {
        Self {
            kind: Some(kind.to_string()),
            schema_version: Some("1.0.0".to_string()),
            ..Self::default()
        }
    }

    /// Illuminant type, preferring `type` over the legacy `illuminant` field.
    pub fn illuminant_type(&self) -> Option<&str> {
        self.kind.as_deref().or(self.illuminant.as_deref())
    }

    /// True if manufacturer and model match, ignoring ASCII case.
    pub fn matches_camera(&self, make: &str, model: &str) -> bool {
        let eq = |field: &Option<String>, want: &str| {
            field.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(want))
        };
        eq(&self.manufacturer, make) && eq(&self.model, model)
    }
}

/// The `spectral_data` object of a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralData {
    /// Units of the samples.
    #[serde(default)]
    pub units: String,
    /// Channel names per channel set.
    pub index: BTreeMap<String, Vec<String>>,
    /// Rows per channel set, keyed by wavelength.
    pub data: BTreeMap<String, BTreeMap<String, Vec<f64>>>,
}

/// One database file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpectralFile {
    /// File header.
    #[serde(default)]
    pub header: Header,
    /// Samples.
    pub spectral_data: SpectralData,
}

impl SpectralFile {
    /// Reads and parses a file.
    pub fn load(path: &Path) -> IdtResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| IdtError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| IdtError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes the file as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> IdtResult<()> {
        let text = serde_json::to_string_pretty(self).map_err(|source| IdtError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| IdtError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serializable form of a curve.
    pub fn from_curve(curve: &SpectralCurve) -> Self {
        let names = curve.channels.iter().map(|c| c.name.clone()).collect();
        let mut rows = BTreeMap::new();
        if let Some(shape) = curve.shape() {
            for (i, wl) in shape.wavelengths().enumerate() {
                let row = curve
                    .channels
                    .iter()
                    .map(|c| c.spectrum.values().get(i).copied().unwrap_or(0.0))
                    .collect();
                rows.insert(format!("{wl}"), row);
            }
        }
        Self {
            header: curve.header.clone(),
            spectral_data: SpectralData {
                units: curve.units.clone(),
                index: BTreeMap::from([(MAIN_SET.to_string(), names)]),
                data: BTreeMap::from([(MAIN_SET.to_string(), rows)]),
            },
        }
    }

    /// Converts the `main` channel set into a curve on its native grid.
    ///
    /// Wavelength keys are sorted numerically and must be evenly spaced;
    /// every row must have one value per indexed channel.
    pub fn to_curve(&self) -> IdtResult<SpectralCurve> {
        let data = &self.spectral_data;
        let names = data
            .index
            .get(MAIN_SET)
            .ok_or_else(|| IdtError::config("spectral data has no 'main' channel index"))?;
        let rows = data
            .data
            .get(MAIN_SET)
            .ok_or_else(|| IdtError::config("spectral data has no 'main' samples"))?;

        let mut parsed = Vec::with_capacity(rows.len());
        for (key, row) in rows {
            let wl: f64 = key
                .trim()
                .parse()
                .map_err(|_| IdtError::config(format!("invalid wavelength '{key}'")))?;
            if row.len() != names.len() {
                return Err(IdtError::config(format!(
                    "wavelength {key} has {} values, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            parsed.push((wl, row));
        }
        parsed.sort_by(|a, b| a.0.total_cmp(&b.0));

        let shape = uniform_shape(parsed.iter().map(|(wl, _)| *wl))?;
        let mut channels = Vec::with_capacity(names.len());
        for (c, name) in names.iter().enumerate() {
            let values = parsed.iter().map(|(_, row)| row[c]).collect();
            channels.push((name.clone(), Spectrum::new(shape, values)?));
        }

        let mut curve = SpectralCurve::from_channels(self.header.clone(), channels);
        curve.units = data.units.clone();
        Ok(curve)
    }
}

/// Derives the grid of a sorted wavelength list.
fn uniform_shape(wavelengths: impl Iterator<Item = f64>) -> IdtResult<Shape> {
    let wls: Vec<f64> = wavelengths.collect();
    match wls.as_slice() {
        [] => Err(IdtError::config("spectral data is empty")),
        [only] => Ok(Shape::new(*only, *only, 1.0)),
        [first, second, ..] => {
            let step = second - first;
            let uniform = step > 0.0
                && wls
                    .windows(2)
                    .all(|w| ((w[1] - w[0]) - step).abs() < 1e-6);
            if !uniform {
                return Err(IdtError::config(
                    "spectral data wavelengths are not evenly spaced",
                ));
            }
            Ok(Shape::new(*first, wls[wls.len() - 1], step))
        }
    }
}

/// Loads a file and resamples it onto `shape`.
pub fn load_curve(path: &Path, shape: &Shape) -> IdtResult<SpectralCurve> {
    let curve = SpectralFile::load(path)?.to_curve()?;
    Ok(curve.reshaped(shape))
}

/// Search paths from [`DATABASE_PATH_ENV`], or the defaults.
pub fn default_search_paths() -> Vec<PathBuf> {
    match env::var_os(DATABASE_PATH_ENV) {
        Some(value) if !value.is_empty() => env::split_paths(&value).collect(),
        _ => DEFAULT_DATABASE_PATHS.iter().map(PathBuf::from).collect(),
    }
}

/// An ordered list of database roots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectralDatabase {
    search_paths: Vec<PathBuf>,
}

impl SpectralDatabase {
    /// Database over the given roots, searched in order.
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self { search_paths }
    }

    /// Database over [`default_search_paths`].
    pub fn from_env() -> Self {
        Self::new(default_search_paths())
    }

    /// Configured roots.
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Resolves a data path.
    ///
    /// Absolute paths are used as-is when they exist. Relative paths are
    /// joined with each root in turn; the first existing file wins.
    pub fn resolve(&self, path: &Path) -> Option<PathBuf> {
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        self.search_paths
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_file())
    }

    /// All `.json` files of one kind across the roots, sorted per root.
    ///
    /// Roots that are not directories and missing kind subdirectories are
    /// skipped with a warning.
    pub fn files(&self, kind: DataKind) -> Vec<PathBuf> {
        let mut out = Vec::new();
        for root in &self.search_paths {
            if !root.is_dir() {
                warn!("Database location '{}' is not a directory.", root.display());
                continue;
            }
            let dir = root.join(kind.dir_name());
            if !dir.is_dir() {
                warn!("Directory '{}' does not exist.", dir.display());
                continue;
            }
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Failed to read directory '{}': {e}", dir.display());
                    continue;
                }
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            out.extend(files);
        }
        out
    }

    /// Parses every file of one kind. Files that fail to parse are skipped
    /// with a warning.
    pub fn scan(&self, kind: DataKind) -> Vec<(PathBuf, SpectralFile)> {
        self.files(kind)
            .into_iter()
            .filter_map(|path| match SpectralFile::load(&path) {
                Ok(file) => Some((path, file)),
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Finds the camera file whose header matches make and model.
    pub fn find_camera(&self, make: &str, model: &str) -> Option<(PathBuf, SpectralFile)> {
        let found = self
            .scan(DataKind::Camera)
            .into_iter()
            .find(|(_, file)| file.header.matches_camera(make, model));
        if let Some((path, _)) = &found {
            debug!(path = %path.display(), "camera data found");
        }
        found
    }

    /// Finds the illuminant file whose type matches, ignoring ASCII case.
    pub fn find_illuminant(&self, kind: &str) -> Option<(PathBuf, SpectralFile)> {
        self.scan(DataKind::Illuminant).into_iter().find(|(_, file)| {
            file.header
                .illuminant_type()
                .is_some_and(|t| t.eq_ignore_ascii_case(kind))
        })
    }
}
