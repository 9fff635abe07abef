//! idt - camera Input Device Transform tool
//!
//! Solves white balance, illuminants and IDT matrices from spectral camera
//! data or DNG colour metadata.

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "idt")]
#[command(author, version, about = "Camera Input Device Transform solver")]
#[command(long_about = "
Derives ACES Input Device Transforms for digital cameras, either from
measured spectral sensitivities or from the colour calibration stored in
DNG metadata.

Spectral data is looked up in the directories given with --database, or
in IDT_DATABASE_PATH when none are given.

Examples:
  idt wb Sony ILCE-7M3 D55                    # White balance multipliers
  idt illuminant Sony ILCE-7M3 2.1 1 1.6      # Illuminant from multipliers
  idt matrix Sony ILCE-7M3 3200K              # Spectral IDT matrix
  idt metadata shot.json                      # IDT from DNG metadata
  idt -v list-cameras
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database directory (repeatable, searched in order)
    #[arg(short, long = "database", global = true)]
    database: Vec<PathBuf>,

    /// Verbose output (-v results and cache activity, -vv solver summary, -vvv optimizer progress)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Recompute everything instead of using the cache
    #[arg(long, global = true)]
    disable_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// White balance multipliers of a camera under an illuminant
    Wb(CameraIlluminantArgs),

    /// Illuminant that best matches white balance multipliers
    Illuminant(MultipliersArgs),

    /// Spectrally fitted IDT matrix of a camera under an illuminant
    #[command(visible_alias = "m")]
    Matrix(CameraIlluminantArgs),

    /// IDT and CAT matrices from DNG colour metadata (JSON)
    Metadata(MetadataArgs),

    /// List cameras in the database
    #[command(name = "list-cameras")]
    ListCameras,

    /// List supported illuminants
    #[command(name = "list-illuminants")]
    ListIlluminants,
}

/// Arguments for `wb` and `matrix`.
#[derive(Args)]
struct CameraIlluminantArgs {
    /// Camera manufacturer
    make: String,

    /// Camera model
    model: String,

    /// Illuminant: daylight (D65, D6500), blackbody (3200K) or a database type
    illuminant: String,
}

/// Arguments for `illuminant`.
#[derive(Args)]
struct MultipliersArgs {
    /// Camera manufacturer
    make: String,

    /// Camera model
    model: String,

    /// White balance multipliers, RGB or RGBG
    #[arg(num_args = 3..=4, required = true, allow_negative_numbers = true)]
    multipliers: Vec<f64>,
}

/// Arguments for `metadata`.
#[derive(Args)]
struct MetadataArgs {
    /// JSON file holding the calibration, neutral and baseline exposure
    input: PathBuf,
}

/// Settings shared by every command.
struct Settings {
    database: Vec<PathBuf>,
    verbose: u8,
    disable_cache: bool,
}

fn init_logging(verbose: u8) -> Result<()> {
    let default = match verbose {
        0 => "warn",
        1 | 2 => "info",
        3 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let settings = Settings {
        database: cli.database,
        verbose: cli.verbose,
        disable_cache: cli.disable_cache,
    };

    match cli.command {
        Commands::Wb(args) => commands::wb::run(args, &settings),
        Commands::Illuminant(args) => commands::illuminant::run(args, &settings),
        Commands::Matrix(args) => commands::matrix::run(args, &settings),
        Commands::Metadata(args) => commands::metadata::run(args, &settings),
        Commands::ListCameras => commands::list::run_cameras(&settings),
        Commands::ListIlluminants => commands::list::run_illuminants(&settings),
    }
}
