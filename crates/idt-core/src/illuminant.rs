//! Illuminant parsing and synthesis.
//!
//! Illuminant names come in three forms, resolved once by
//! [`IlluminantKind::parse`]:
//!
//! | Form | Example | Meaning |
//! |------|---------|---------|
//! | `d<digits>` | `D65`, `d6500` | CIE daylight; digits are hundreds of kelvin (40-250) or kelvin (4000-25000) |
//! | `<digits>k` | `3200K` | Blackbody (Planckian) radiator, 1500-3999K |
//! | anything else | `iso7589` | Looked up by type in the database |
//!
//! Short daylight names follow the CIE convention that D65 means
//! 6500 * 1.4387752 / 1.438 kelvin, the correction for the revised second
//! radiation constant.

use crate::error::{IdtError, IdtResult};
use crate::spectrum::{Shape, SpectralCurve, Spectrum};

/// Second radiation constant used by the CIE D-series names.
const C2_CORRECTION: f64 = 1.438_775_2 / 1.438;

const DAYLIGHT_RANGE: &str =
    "The range of Correlated Color Temperature for Day Light should be from 4000 to 25000.";
const BLACKBODY_RANGE: &str =
    "The range of Color Temperature for BlackBody should be from 1500 to 3999.";

/// Planck constant (J s).
const PLANCK: f64 = 6.626_070_15e-34;
/// Speed of light (m/s).
const LIGHT_SPEED: f64 = 299_792_458.0;
/// Boltzmann constant (J/K).
const BOLTZMANN: f64 = 1.380_649e-23;

/// CIE daylight basis functions S0, S1, S2 at 10nm from 380 to 780nm.
const DAYLIGHT_BASIS: [[f64; 3]; 41] = [
    [63.4, 38.5, 3.0],
    [65.8, 35.0, 1.2],
    [94.8, 43.4, -1.1],
    [104.8, 46.3, -0.5],
    [105.9, 43.9, -0.7],
    [96.8, 37.1, -1.2],
    [113.9, 36.7, -2.6],
    [125.6, 35.9, -2.9],
    [125.5, 32.6, -2.8],
    [121.3, 27.9, -2.6],
    [121.3, 24.3, -2.6],
    [113.5, 20.1, -1.8],
    [113.1, 16.2, -1.5],
    [110.8, 13.2, -1.3],
    [106.5, 8.6, -1.2],
    [108.8, 6.1, -1.0],
    [105.3, 4.2, -0.5],
    [104.4, 1.9, -0.3],
    [100.0, 0.0, 0.0],
    [96.0, -1.6, 0.2],
    [95.1, -3.5, 0.5],
    [89.1, -3.5, 2.1],
    [90.5, -5.8, 3.2],
    [90.3, -7.2, 4.1],
    [88.4, -8.6, 4.7],
    [84.0, -9.5, 5.1],
    [85.1, -10.9, 6.7],
    [81.9, -10.7, 7.3],
    [82.6, -12.0, 8.6],
    [84.9, -14.0, 9.8],
    [81.3, -13.6, 10.2],
    [71.9, -12.0, 8.3],
    [74.3, -13.3, 9.6],
    [76.4, -12.9, 8.5],
    [63.3, -10.6, 7.0],
    [71.7, -11.6, 7.6],
    [77.0, -12.2, 8.0],
    [65.2, -10.2, 6.7],
    [47.7, -7.8, 5.2],
    [68.6, -11.2, 7.4],
    [65.0, -10.4, 6.8],
];

/// Grid of [`DAYLIGHT_BASIS`].
const DAYLIGHT_SHAPE: Shape = Shape::new(380.0, 780.0, 10.0);

/// A parsed illuminant name.
#[derive(Debug, Clone, PartialEq)]
pub enum IlluminantKind {
    /// CIE daylight at a CCT in kelvin.
    Daylight(f64),
    /// Blackbody radiator at a temperature in kelvin.
    Blackbody(f64),
    /// Database illuminant, by lowercased type name.
    Named(String),
}

impl IlluminantKind {
    /// Parses an illuminant name, validating temperature ranges.
    ///
    /// # Errors
    ///
    /// [`IdtError::Config`] when a daylight or blackbody temperature is
    /// outside its valid range.
    pub fn parse(name: &str) -> IdtResult<Self> {
        let lower = name.trim().to_ascii_lowercase();

        if let Some(digits) = lower.strip_prefix('d').filter(|d| is_digits(d)) {
            return match digits.parse::<u32>() {
                Ok(n @ 40..=250) => Ok(Self::Daylight(f64::from(n) * 100.0 * C2_CORRECTION)),
                Ok(n @ 4000..=25000) => Ok(Self::Daylight(f64::from(n))),
                _ => Err(IdtError::config(DAYLIGHT_RANGE)),
            };
        }

        if let Some(digits) = lower.strip_suffix('k').filter(|d| is_digits(d)) {
            return match digits.parse::<u32>() {
                Ok(n @ 1500..=3999) => Ok(Self::Blackbody(f64::from(n))),
                _ => Err(IdtError::config(BLACKBODY_RANGE)),
            };
        }

        Ok(Self::Named(lower))
    }

    /// Temperature of a synthesized illuminant.
    pub fn cct(&self) -> Option<f64> {
        match self {
            Self::Daylight(t) | Self::Blackbody(t) => Some(*t),
            Self::Named(_) => None,
        }
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// A resolved illuminant: type name, temperature if synthesized, and its
/// spectral power distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct Illuminant {
    /// Lowercased type name, e.g. "d65" or "3200k".
    pub type_name: String,
    /// Correlated colour temperature for daylight and blackbody.
    pub cct: Option<f64>,
    /// Spectral power.
    pub spectrum: Spectrum,
}

impl Illuminant {
    /// Synthesizes a daylight or blackbody illuminant.
    ///
    /// Returns `None` for [`IlluminantKind::Named`].
    pub fn synthesize(type_name: &str, kind: &IlluminantKind, shape: &Shape) -> Option<Self> {
        let spectrum = match *kind {
            IlluminantKind::Daylight(cct) => daylight_spd(cct, shape),
            IlluminantKind::Blackbody(cct) => blackbody_spd(cct, shape),
            IlluminantKind::Named(_) => return None,
        };
        Some(Self {
            type_name: type_name.to_ascii_lowercase(),
            cct: kind.cct(),
            spectrum,
        })
    }

    /// Illuminant from a database curve. The curve must have one channel.
    pub fn from_curve(type_name: &str, curve: &SpectralCurve) -> IdtResult<Self> {
        if curve.channel_count() != 1 {
            return Err(IdtError::config(format!(
                "illuminant '{type_name}' has {} channels, expected 1",
                curve.channel_count()
            )));
        }
        let spectrum = curve
            .channel_at(0)
            .cloned()
            .ok_or_else(|| IdtError::config("illuminant has no data"))?;
        Ok(Self {
            type_name: type_name.to_ascii_lowercase(),
            cct: None,
            spectrum,
        })
    }

    /// The same illuminant scaled so that sample `index` equals 1.
    ///
    /// Unchanged if that sample is zero or out of range.
    pub fn normalized_at(&self, index: usize) -> Illuminant {
        match self.spectrum.values().get(index) {
            Some(&v) if v != 0.0 && v.is_finite() => Illuminant {
                spectrum: self.spectrum.scaled(1.0 / v),
                ..self.clone()
            },
            _ => self.clone(),
        }
    }
}

/// Names of the synthesized illuminants tried during auto-detection:
/// daylight d40..d250 and blackbody 1500k..3500k, both in 500K steps.
pub fn builtin_names() -> Vec<String> {
    let daylight = (40..=250).step_by(5).map(|n| format!("d{n}"));
    let blackbody = (1500..=3500).step_by(500).map(|t| format!("{t}k"));
    daylight.chain(blackbody).collect()
}

/// CIE daylight chromaticity x for a CCT.
fn daylight_x(cct: f64) -> f64 {
    let t = cct;
    if t <= 7000.0 {
        -4.6070e9 / t.powi(3) + 2.9678e6 / t.powi(2) + 0.09911e3 / t + 0.244063
    } else {
        -2.0064e9 / t.powi(3) + 1.9018e6 / t.powi(2) + 0.24748e3 / t + 0.237040
    }
}

/// CIE daylight spectral power distribution at `cct`.
///
/// Built from the S0/S1/S2 basis weighted by M1/M2 from the daylight
/// locus, then resampled onto `shape`.
pub fn daylight_spd(cct: f64, shape: &Shape) -> Spectrum {
    let x = daylight_x(cct);
    let y = -3.0 * x * x + 2.87 * x - 0.275;
    let m = 0.0241 + 0.2562 * x - 0.7341 * y;
    let m1 = (-1.3515 - 1.7703 * x + 5.9114 * y) / m;
    let m2 = (0.0300 - 31.4424 * x + 30.0717 * y) / m;

    let coarse = Spectrum::from_fn(DAYLIGHT_SHAPE, |wl| {
        let i = ((wl - DAYLIGHT_SHAPE.first) / DAYLIGHT_SHAPE.step).round() as usize;
        let s = DAYLIGHT_BASIS[i.min(DAYLIGHT_BASIS.len() - 1)];
        s[0] + m1 * s[1] + m2 * s[2]
    });
    coarse.reshape(shape)
}

/// Planckian spectral radiant exitance at `cct` (W m^-3).
pub fn blackbody_spd(cct: f64, shape: &Shape) -> Spectrum {
    Spectrum::from_fn(*shape, |wl| {
        let lambda = wl * 1e-9;
        let c1 = 2.0 * std::f64::consts::PI * PLANCK * LIGHT_SPEED * LIGHT_SPEED;
        let c2 = PLANCK * LIGHT_SPEED / BOLTZMANN;
        c1 / (lambda.powi(5) * ((c2 / (lambda * cct)).exp() - 1.0))
    })
}
