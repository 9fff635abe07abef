//! IDT from DNG colour metadata.
//!
//! The input is the JSON form of [`Metadata`]:
//!
//! ```json
//! {
//!   "calibration": [
//!     { "illuminant": 17, "camera_calibration_matrix": [...], "xyz_to_rgb_matrix": [...] },
//!     { "illuminant": 21, "camera_calibration_matrix": [...], "xyz_to_rgb_matrix": [...] }
//!   ],
//!   "neutral_rgb": [0.629, 1.0, 0.79],
//!   "baseline_exposure": 0.0
//! }
//! ```

use anyhow::{Context, Result};
use idt_cache::TransformCaches;
use idt_core::{Metadata, MetadataSolver};
use tracing::{info, trace};

use super::{fetch_options, print_matrix};
use crate::{MetadataArgs, Settings};

pub fn run(args: MetadataArgs, settings: &Settings) -> Result<()> {
    trace!(input = %args.input.display(), "metadata::run");

    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read: {}", args.input.display()))?;
    let metadata: Metadata = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse metadata: {}", args.input.display()))?;
    info!(
        illuminants = ?[metadata.calibration[0].illuminant, metadata.calibration[1].illuminant],
        "loaded metadata"
    );

    let mut caches = TransformCaches::new();
    let idt = caches
        .fetch_matrix_from_metadata(&metadata, &fetch_options(settings))
        .context("Failed to calculate IDT matrix")?;
    let cat = MetadataSolver::new(&metadata)
        .calculate_cat_matrix()
        .context("Failed to calculate CAT matrix")?;

    println!("IDT:");
    print_matrix(&idt);
    println!("CAT:");
    print_matrix(&cat);
    Ok(())
}
