//! White balance from an illuminant.

use anyhow::{Context, Result};
use idt_cache::TransformCaches;
use tracing::trace;

use super::{fetch_options, solver};
use crate::{CameraIlluminantArgs, Settings};

pub fn run(args: CameraIlluminantArgs, settings: &Settings) -> Result<()> {
    trace!(make = %args.make, model = %args.model, illuminant = %args.illuminant, "wb::run");

    let mut caches = TransformCaches::new();
    let mut solver = solver(settings);
    let wb = caches
        .fetch_multipliers_from_illuminant(
            &args.make,
            &args.model,
            &args.illuminant,
            &mut solver,
            &fetch_options(settings),
        )
        .context("Failed to calculate white balance")?;

    println!("{:.10} {:.10} {:.10}", wb.x, wb.y, wb.z);
    Ok(())
}
