//! Sampled spectral curves.
//!
//! A [`Spectrum`] is one channel of samples on a uniform wavelength grid
//! ([`Shape`]). A [`SpectralCurve`] groups named channels that share a grid:
//! R/G/B camera sensitivities, X/Y/Z colour matching functions, a single
//! illuminant power channel, or one channel per training patch.
//!
//! Curves combined in one computation must share their grid. Products and
//! dot products check this and fail instead of silently misaligning;
//! [`Spectrum::reshape`] moves a curve onto another grid first.

use crate::database::Header;
use crate::error::{IdtError, IdtResult};
use idt_math::sample_uniform;

/// Tolerance when comparing wavelengths.
const WAVELENGTH_EPSILON: f64 = 1e-6;

/// A uniform wavelength grid in nanometres, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shape {
    /// First wavelength.
    pub first: f64,
    /// Last wavelength.
    pub last: f64,
    /// Spacing between samples.
    pub step: f64,
}

impl Shape {
    /// The working grid: 380-780nm every 5nm.
    pub const DEFAULT: Shape = Shape {
        first: 380.0,
        last: 780.0,
        step: 5.0,
    };

    /// Creates a grid.
    pub const fn new(first: f64, last: f64, step: f64) -> Self {
        Self { first, last, step }
    }

    /// Number of samples on the grid.
    pub fn len(&self) -> usize {
        if self.step <= 0.0 || self.last < self.first {
            return 0;
        }
        ((self.last - self.first) / self.step).round() as usize + 1
    }

    /// True when the grid holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wavelength of sample `i`.
    #[inline]
    pub fn wavelength(&self, i: usize) -> f64 {
        self.first + self.step * i as f64
    }

    /// All wavelengths on the grid.
    pub fn wavelengths(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| self.wavelength(i))
    }

    /// True if both grids have the same bounds and spacing.
    pub fn aligned_with(&self, other: &Shape) -> bool {
        (self.first - other.first).abs() < WAVELENGTH_EPSILON
            && (self.last - other.last).abs() < WAVELENGTH_EPSILON
            && (self.step - other.step).abs() < WAVELENGTH_EPSILON
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One channel of spectral samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    shape: Shape,
    values: Vec<f64>,
}

impl Spectrum {
    /// Creates a spectrum, checking the sample count against the grid.
    pub fn new(shape: Shape, values: Vec<f64>) -> IdtResult<Self> {
        if values.len() != shape.len() {
            return Err(IdtError::config(format!(
                "spectrum has {} samples but its {}-{}nm/{}nm grid needs {}",
                values.len(),
                shape.first,
                shape.last,
                shape.step,
                shape.len()
            )));
        }
        Ok(Self { shape, values })
    }

    /// Evaluates `f(wavelength)` across a grid.
    pub fn from_fn(shape: Shape, f: impl Fn(f64) -> f64) -> Self {
        let values = shape.wavelengths().map(f).collect();
        Self { shape, values }
    }

    /// Grid of this spectrum.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Raw samples.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Resamples onto `shape` by linear interpolation.
    ///
    /// Wavelengths outside this spectrum's range are zero.
    pub fn reshape(&self, shape: &Shape) -> Spectrum {
        if self.shape.aligned_with(shape) {
            return self.clone();
        }
        Spectrum::from_fn(*shape, |wl| {
            sample_uniform(self.shape.first, self.shape.step, &self.values, wl).unwrap_or(0.0)
        })
    }

    /// Element-wise product with an aligned spectrum.
    pub fn product(&self, other: &Spectrum) -> IdtResult<Spectrum> {
        self.check_aligned(other)?;
        let values = self.values.iter().zip(&other.values).map(|(a, b)| a * b).collect();
        Ok(Spectrum {
            shape: self.shape,
            values,
        })
    }

    /// Sum of the element-wise product with an aligned spectrum.
    pub fn dot(&self, other: &Spectrum) -> IdtResult<f64> {
        self.check_aligned(other)?;
        Ok(self.values.iter().zip(&other.values).map(|(a, b)| a * b).sum())
    }

    /// Sum of all samples.
    pub fn integrate(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Every sample multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Spectrum {
        Spectrum {
            shape: self.shape,
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Index of the largest sample (first one on ties).
    pub fn argmax(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if best.is_none_or(|(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| i)
    }

    /// True if every sample is finite.
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    fn check_aligned(&self, other: &Spectrum) -> IdtResult<()> {
        if self.shape.aligned_with(&other.shape) {
            Ok(())
        } else {
            Err(IdtError::config(format!(
                "spectral grids differ: {:?} vs {:?}",
                self.shape, other.shape
            )))
        }
    }
}

/// A named channel of a [`SpectralCurve`].
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Channel name from the file's index, e.g. "R" or a patch name.
    pub name: String,
    /// Samples.
    pub spectrum: Spectrum,
}

/// A set of named channels sharing one wavelength grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectralCurve {
    /// File header (manufacturer/model or illuminant type).
    pub header: Header,
    /// Units of the samples, e.g. "relative".
    pub units: String,
    /// Channels in index order.
    pub channels: Vec<Channel>,
}

impl SpectralCurve {
    /// Builds a curve from `(name, spectrum)` pairs.
    pub fn from_channels(
        header: Header,
        channels: impl IntoIterator<Item = (String, Spectrum)>,
    ) -> Self {
        Self {
            header,
            units: "relative".to_string(),
            channels: channels
                .into_iter()
                .map(|(name, spectrum)| Channel { name, spectrum })
                .collect(),
        }
    }

    /// Number of channels.
    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel by name (case-insensitive).
    pub fn channel(&self, name: &str) -> Option<&Spectrum> {
        self.channels
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| &c.spectrum)
    }

    /// Channel by position.
    pub fn channel_at(&self, i: usize) -> Option<&Spectrum> {
        self.channels.get(i).map(|c| &c.spectrum)
    }

    /// Grid of the first channel.
    pub fn shape(&self) -> Option<&Shape> {
        self.channels.first().map(|c| c.spectrum.shape())
    }

    /// All channels resampled onto `shape`.
    pub fn reshaped(&self, shape: &Shape) -> SpectralCurve {
        SpectralCurve {
            header: self.header.clone(),
            units: self.units.clone(),
            channels: self
                .channels
                .iter()
                .map(|c| Channel {
                    name: c.name.clone(),
                    spectrum: c.spectrum.reshape(shape),
                })
                .collect(),
        }
    }

    /// True if every sample of every channel is finite.
    pub fn is_finite(&self) -> bool {
        self.channels.iter().all(|c| c.spectrum.is_finite())
    }
}
