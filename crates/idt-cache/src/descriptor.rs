//! Cache descriptors and cached data.
//!
//! Descriptors render as comma separated fields in cache logs, e.g.
//! `Sony, ILCE-7M3, d55` or `Sony, ILCE-7M3, (2.1, 1, 1.6)`.

use std::fmt;

use idt_core::Vec3;

/// Camera plus illuminant name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraIlluminant {
    /// Camera manufacturer.
    pub make: String,
    /// Camera model.
    pub model: String,
    /// Illuminant name, lowercased.
    pub illuminant: String,
}

impl CameraIlluminant {
    /// Builds a descriptor; the illuminant name is trimmed and lowercased.
    pub fn new(make: &str, model: &str, illuminant: &str) -> Self {
        Self {
            make: make.to_string(),
            model: model.to_string(),
            illuminant: illuminant.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for CameraIlluminant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.make, self.model, self.illuminant)
    }
}

/// Camera plus normalized white balance multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraMultipliers {
    /// Camera manufacturer.
    pub make: String,
    /// Camera model.
    pub model: String,
    /// RGB multipliers.
    pub multipliers: Vec3,
}

impl fmt::Display for CameraMultipliers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.multipliers;
        write!(f, "{}, {}, ({}, {}, {})", self.make, self.model, m.x, m.y, m.z)
    }
}

/// Result of matching white balance multipliers to an illuminant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IlluminantMultipliers {
    /// Best matching illuminant type, e.g. `"d55"` or `"3200k"`.
    pub illuminant: String,
    /// Multipliers the solver computed for that illuminant.
    pub multipliers: Vec3,
}
