//! # idt-cache
//!
//! Memoization for the camera IDT solvers.
//!
//! Solving an IDT spectrally means loading several database files and
//! running a least-squares fit. Tools that convert many frames from the
//! same camera ask the same question over and over, so every entry point
//! here goes through a small most-recently-used cache first.
//!
//! # Architecture
//!
//! ```text
//!  TransformCaches::fetch_*          (descriptor -> result)
//!         |
//!  Cache<D, T>  "WB from illuminant"
//!               "illuminant from WB"
//!               "matrix from illuminant"
//!               "matrix from DNG metadata"
//!         |  miss
//!  SpectralSolver / MetadataSolver   (idt-core)
//! ```
//!
//! A failed computation is cached like a successful one: asking again for
//! the same descriptor returns the original error without re-running the
//! solver.
//!
//! # Example
//!
//! ```rust,no_run
//! use idt_cache::{FetchOptions, TransformCaches};
//! use idt_core::SpectralSolver;
//!
//! let mut caches = TransformCaches::new();
//! let mut solver = SpectralSolver::new(idt_core::database::default_search_paths());
//! let options = FetchOptions::default();
//!
//! let wb = caches.fetch_multipliers_from_illuminant("Sony", "ILCE-7M3", "D55", &mut solver, &options)?;
//! let idt = caches.fetch_matrix_from_illuminant("Sony", "ILCE-7M3", "D55", &mut solver, &options)?;
//! # Ok::<(), idt_cache::FetchError>(())
//! ```
//!
//! # Thread Safety
//!
//! None. Caches are plain values mutated through `&mut self`; wrap them in
//! a `Mutex` to share across threads.

#![warn(missing_docs)]

pub mod cache;
pub mod descriptor;
pub mod transform;

pub use cache::{Cache, DEFAULT_CAPACITY};
pub use descriptor::{CameraIlluminant, CameraMultipliers, IlluminantMultipliers};
pub use transform::{FetchError, FetchOptions, Outcome, TransformCaches, normalize_multipliers};
