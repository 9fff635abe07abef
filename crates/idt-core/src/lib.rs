//! # idt-core
//!
//! Input Device Transform (IDT) solvers for digital cameras.
//!
//! An IDT maps a camera's white balanced raw RGB into ACES 2065-1. This
//! crate derives one in two independent ways:
//!
//! - **Spectral** ([`SpectralSolver`]) - fits the matrix from measured camera
//!   sensitivities, an illuminant and training reflectances
//! - **Metadata** ([`MetadataSolver`]) - interpolates the two colour
//!   calibrations stored in a DNG by the scene's colour temperature
//!
//! Both rest on shared colorimetry: Robertson CCT estimation, mired
//! blending, daylight/blackbody synthesis and CIE Lab.
//!
//! # Architecture
//!
//! ```text
//!               SpectralSolver            MetadataSolver
//!                     |                         |
//!     +---------+-----+------+---------+        |
//!     |         |            |         |        |
//!  database  illuminant  optimize     lab       |
//!     |         |                               |
//!  spectrum     +--------------+----------------+
//!                              |
//!                         temperature
//!                              |
//!                  idt-primaries, idt-math
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use idt_core::{DataKind, SpectralSolver};
//!
//! let mut solver = SpectralSolver::new(idt_core::database::default_search_paths());
//! solver.find_camera("Blackmagic", "Cinema Camera")?;
//! solver.load_spectral_data("training/training_spectral.json", DataKind::Training)?;
//! solver.load_spectral_data("cmf/cmf_1931.json", DataKind::Cmf)?;
//! solver.find_illuminant("D65")?;
//! let wb = solver.calculate_wb()?;
//! let idt = solver.calculate_idt_matrix()?;
//! println!("{wb:?}\n{idt:?}");
//! # Ok::<(), idt_core::IdtError>(())
//! ```
//!
//! # Diagnostics
//!
//! Failures are returned as [`IdtError`] and also logged through `tracing`.
//! Informational output is gated by each solver's `verbosity`.
//!
//! # Dependencies
//!
//! - [`idt-math`] - Mat3/Vec3, chromatic adaptation
//! - [`idt-primaries`] - ACES primaries and RGB/XYZ matrices
//! - `serde`, `serde_json` - database files and metadata
//! - `tracing` - diagnostics
//!
//! # Used By
//!
//! - `idt-cache` - memoized solver entry points
//! - `idt-cli` - command line front end

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod database;
pub mod error;
pub mod illuminant;
pub mod lab;
pub mod metadata;
pub mod optimize;
pub mod spectral;
pub mod spectrum;
pub mod temperature;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use database::{DataKind, Header, SpectralDatabase, SpectralFile};
pub use error::{IdtError, IdtResult};
pub use illuminant::{Illuminant, IlluminantKind};
pub use metadata::{Calibration, Metadata, MetadataSolver};
pub use optimize::{LmConfig, LmReport, Termination};
pub use spectral::{FitMode, SpectralSolver};
pub use spectrum::{Shape, SpectralCurve, Spectrum};

// Shared math, re-exported for downstream crates.
pub use idt_math::{Mat3, Vec3};
