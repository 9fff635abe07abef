//! Illuminant detection from white balance multipliers.

use anyhow::{Context, Result};
use idt_cache::TransformCaches;
use tracing::trace;

use super::{fetch_options, solver};
use crate::{MultipliersArgs, Settings};

pub fn run(args: MultipliersArgs, settings: &Settings) -> Result<()> {
    trace!(make = %args.make, model = %args.model, wb = ?args.multipliers, "illuminant::run");

    let mut caches = TransformCaches::new();
    let mut solver = solver(settings);
    let found = caches
        .fetch_illuminant_from_multipliers(
            &args.make,
            &args.model,
            &args.multipliers,
            &mut solver,
            &fetch_options(settings),
        )
        .context("Failed to detect illuminant")?;

    println!("{}", found.illuminant);
    if settings.verbose > 0 {
        let wb = found.multipliers;
        println!("{:.10} {:.10} {:.10}", wb.x, wb.y, wb.z);
    }
    Ok(())
}
