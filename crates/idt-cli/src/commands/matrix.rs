//! Spectral IDT matrix.

use anyhow::{Context, Result};
use idt_cache::TransformCaches;
use tracing::trace;

use super::{fetch_options, print_matrix, solver};
use crate::{CameraIlluminantArgs, Settings};

pub fn run(args: CameraIlluminantArgs, settings: &Settings) -> Result<()> {
    trace!(make = %args.make, model = %args.model, illuminant = %args.illuminant, "matrix::run");

    let mut caches = TransformCaches::new();
    let mut solver = solver(settings);
    let matrix = caches
        .fetch_matrix_from_illuminant(
            &args.make,
            &args.model,
            &args.illuminant,
            &mut solver,
            &fetch_options(settings),
        )
        .context("Failed to calculate IDT matrix")?;

    print_matrix(&matrix);
    Ok(())
}
