//! Database listings.

use anyhow::Result;

use super::solver;
use crate::Settings;

pub fn run_cameras(settings: &Settings) -> Result<()> {
    let cameras = solver(settings).list_cameras();
    if cameras.is_empty() && settings.verbose > 0 {
        println!("No cameras found");
    }
    for camera in cameras {
        println!("{camera}");
    }
    Ok(())
}

pub fn run_illuminants(settings: &Settings) -> Result<()> {
    for illuminant in solver(settings).list_illuminants() {
        println!("{illuminant}");
    }
    Ok(())
}
