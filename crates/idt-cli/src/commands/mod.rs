//! CLI command implementations

pub mod illuminant;
pub mod list;
pub mod matrix;
pub mod metadata;
pub mod wb;

use idt_cache::FetchOptions;
use idt_core::database::default_search_paths;
use idt_core::{Mat3, SpectralSolver};
use tracing::debug;

use crate::Settings;

/// Spectral solver over `--database` directories, or the default search
/// paths when none were given.
pub fn solver(settings: &Settings) -> SpectralSolver {
    let paths = if settings.database.is_empty() {
        default_search_paths()
    } else {
        settings.database.clone()
    };
    debug!(?paths, "database search paths");
    let mut solver = SpectralSolver::new(paths);
    solver.verbosity = settings.verbose;
    solver
}

/// Fetch options derived from the global flags.
pub fn fetch_options(settings: &Settings) -> FetchOptions {
    FetchOptions {
        verbosity: settings.verbose,
        disable_cache: settings.disable_cache,
        ..FetchOptions::default()
    }
}

/// Prints a matrix one row per line.
pub fn print_matrix(matrix: &Mat3) {
    for [a, b, c] in matrix.m {
        println!("{a:.10} {b:.10} {c:.10}");
    }
}
