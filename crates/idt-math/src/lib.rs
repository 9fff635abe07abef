//! # idt-math
//!
//! Double-precision math primitives for camera colour characterisation.
//!
//! This crate provides the linear algebra the IDT solvers are built on:
//!
//! - [`Mat3`] - 3x3 matrices for colour space transformations
//! - [`Vec3`] - 3D vectors for XYZ/RGB triplets
//! - Chromatic adaptation transforms (Bradford, CAT02)
//! - Interpolation utilities (lerp, table lookup)
//!
//! # Design
//!
//! Everything is `f64`: calibration matrices from DNG metadata and the
//! least-squares fit both need more precision than image pipelines do.
//! All matrix operations assume **row-major** storage and **column vectors**:
//!
//! ```text
//! result = matrix * vector
//! ```
//!
//! # Usage
//!
//! ```rust
//! use idt_math::{Mat3, Vec3};
//!
//! let ap0_to_xyz = Mat3::from_rows([
//!     [0.9525523959, 0.0, 0.0000936786],
//!     [0.3439664498, 0.7281660966, -0.0721325464],
//!     [0.0, 0.0, 1.0088251844],
//! ]);
//!
//! let white = ap0_to_xyz * Vec3::ONE;
//! assert!((white.y - 1.0).abs() < 1e-9);
//! ```
//!
//! # Dependencies
//!
//! - [`glam`] - matrix inversion and interop (`DMat3`/`DVec3`)
//!
//! # Used By
//!
//! - `idt-primaries` - RGB/XYZ matrix generation
//! - `idt-core` - colorimetry, spectral and metadata solvers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod adapt;
mod interp;
mod mat3;
mod vec3;

pub use adapt::*;
pub use interp::*;
pub use mat3::*;
pub use vec3::*;
