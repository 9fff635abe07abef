//! Cached entry points end to end.

use approx::assert_abs_diff_eq;
use idt_cache::{FetchError, FetchOptions, TransformCaches};
use idt_core::testing::capture_logs;
use idt_core::{Calibration, Mat3, Metadata, MetadataSolver};

use crate::fixtures::TestDatabase;

const MAKE: &str = TestDatabase::MAKE;
const MODEL: &str = TestDatabase::MODEL;

fn verbose() -> FetchOptions {
    FetchOptions {
        verbosity: 1,
        ..FetchOptions::default()
    }
}

fn has_line(logs: &str, line: &str) -> bool {
    logs.lines().any(|l| l.trim() == line)
}

#[test]
fn test_matrix_from_illuminant_is_cached() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();
    let options = verbose();

    let (first, logs) = capture_logs(|| {
        caches.fetch_matrix_from_illuminant(MAKE, MODEL, "D65", &mut solver, &options)
    });
    let first = first.unwrap();
    assert!(has_line(&logs, "Cache (matrix from illuminant): not found. Calculating a new entry."));
    assert!(has_line(&logs, "Input Device Transform (IDT) matrix:"));
    for i in 0..3 {
        assert_abs_diff_eq!(first.row_sums()[i], 1.0, epsilon = 1e-9);
    }

    // A hit never touches the solver.
    let mut fresh = db.solver();
    let (second, logs) = capture_logs(|| {
        caches.fetch_matrix_from_illuminant(MAKE, MODEL, "d65", &mut fresh, &options)
    });
    assert_eq!(second.unwrap(), first);
    assert!(has_line(&logs, "Cache (matrix from illuminant): found in cache!"));
    assert!(fresh.camera().is_none());
}

#[test]
fn test_matches_uncached_solver() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();
    let options = FetchOptions::default();

    let wb = caches
        .fetch_multipliers_from_illuminant(MAKE, MODEL, "3200K", &mut solver, &options)
        .unwrap();
    let idt = caches
        .fetch_matrix_from_illuminant(MAKE, MODEL, "3200K", &mut solver, &options)
        .unwrap();

    let mut direct = db.loaded_solver().unwrap();
    direct.find_illuminant("3200K").unwrap();
    assert_eq!(direct.calculate_wb().unwrap(), wb);
    assert!(direct.calculate_idt_matrix().unwrap().max_abs_diff(&idt) < 1e-12);
}

#[test]
fn test_multipliers_logged() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();

    let (wb, logs) = capture_logs(|| {
        caches.fetch_multipliers_from_illuminant(MAKE, MODEL, "d55", &mut solver, &verbose())
    });
    assert_eq!(wb.unwrap().y, 1.0);
    assert!(has_line(
        &logs,
        "Cache (WB from illuminant): searching for an entry [Blackmagic, Cinema Camera, d55]."
    ));
    assert!(has_line(&logs, "White balance coefficients:"));
}

#[test]
fn test_illuminant_from_rgbg_multipliers() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();

    let (found, logs) = capture_logs(|| {
        caches.fetch_illuminant_from_multipliers(
            MAKE,
            MODEL,
            &[1.5, 1.0, 1.2, 1.0],
            &mut solver,
            &verbose(),
        )
    });
    let found = found.unwrap();
    assert_eq!(found.illuminant, "2000k");
    assert_eq!(found.multipliers.y, 1.0);
    assert!(has_line(&logs, "Found illuminant: '2000k'."));
    assert!(has_line(
        &logs,
        "Cache (illuminant from WB): searching for an entry [Blackmagic, Cinema Camera, (1.5, 1, 1.2)]."
    ));

    // Greens average to 1.5, then everything is divided by the minimum.
    let found = caches
        .fetch_illuminant_from_multipliers(
            MAKE,
            MODEL,
            &[2.0, 1.5, 1.8, 1.5],
            &mut solver,
            &FetchOptions::default(),
        )
        .unwrap();
    assert_eq!(found.illuminant, "1500k");
}

#[test]
fn test_bad_multiplier_count() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();
    let err = caches
        .fetch_illuminant_from_multipliers(MAKE, MODEL, &[1.0, 2.0], &mut solver, &verbose())
        .unwrap_err();
    assert_eq!(err, FetchError::MultiplierCount(2));
    assert!(caches.illuminant_from_wb.is_empty());
}

#[test]
fn test_failure_is_cached_until_disabled() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();
    let mut options = FetchOptions::default();

    let err = caches
        .fetch_multipliers_from_illuminant("Nope", "X", "d65", &mut solver, &options)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to find spectral data for camera make: 'Nope', model: 'X'. \
         Please check the database search path in IDT_DATABASE_PATH"
    );

    // The replay comes from the cache and keeps the cause.
    options.verbosity = 1;
    let (replayed, logs) = capture_logs(|| {
        caches.fetch_multipliers_from_illuminant("Nope", "X", "d65", &mut solver, &options)
    });
    assert_eq!(replayed.unwrap_err(), err);
    assert!(has_line(&logs, "Cache (WB from illuminant): found in cache!"));

    options.disable_cache = true;
    let (err, logs) = capture_logs(|| {
        caches.fetch_multipliers_from_illuminant("Nope", "X", "d65", &mut solver, &options)
    });
    assert!(matches!(err, Err(FetchError::Camera { .. })));
    assert!(has_line(&logs, "Cache (WB from illuminant): disabled."));
    assert!(caches.wb_from_illuminant.is_empty());
}

#[test]
fn test_illuminant_errors() {
    let db = TestDatabase::standard().unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();
    let options = FetchOptions::default();

    for name in ["d20", "Studio"] {
        let err = caches
            .fetch_matrix_from_illuminant(MAKE, MODEL, name, &mut solver, &options)
            .unwrap_err();
        assert_eq!(err, FetchError::Illuminant(name.to_lowercase()));
    }
}

#[test]
fn test_missing_training_and_observer() {
    let db = TestDatabase::new()
        .unwrap()
        .with_camera(MAKE, MODEL, &["R", "G", "B"])
        .unwrap()
        .with_training()
        .unwrap();
    let mut caches = TransformCaches::new();
    let mut solver = db.solver();

    let err = caches
        .fetch_matrix_from_illuminant(MAKE, MODEL, "d65", &mut solver, &FetchOptions::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to find observer 'cmf/cmf_1931.json'. \
         Please check the database search path in IDT_DATABASE_PATH"
    );

    let options = FetchOptions {
        training_data: "training/other.json".into(),
        ..FetchOptions::default()
    };
    let err = caches
        .fetch_matrix_from_illuminant(MAKE, MODEL, "d50", &mut solver, &options)
        .unwrap_err();
    assert_eq!(err, FetchError::TrainingData("training/other.json".into()));
}

#[test]
fn test_matrix_from_metadata() {
    let mut metadata = Metadata::default();
    metadata.calibration = [
        Calibration {
            illuminant: 17,
            camera_calibration_matrix: Mat3::IDENTITY.to_flat(),
            xyz_to_rgb_matrix: [1.31197, -0.49679, 0.01156, -0.41723, 1.44237, 0.04528, 0.06723, 0.21710, 0.72651],
        },
        Calibration {
            illuminant: 21,
            camera_calibration_matrix: Mat3::IDENTITY.to_flat(),
            xyz_to_rgb_matrix: [1.00885, -0.27351, -0.08258, -0.48997, 1.34441, 0.11174, -0.06406, 0.32997, 0.53917],
        },
    ];
    metadata.neutral_rgb = vec![0.629, 1.0, 0.7904];
    metadata.baseline_exposure = 2.4;

    let mut caches = TransformCaches::new();
    let expected = MetadataSolver::new(&metadata).calculate_idt_matrix().unwrap();

    let (idt, logs) = capture_logs(|| caches.fetch_matrix_from_metadata(&metadata, &verbose()));
    assert_eq!(idt.unwrap(), expected);
    assert!(has_line(
        &logs,
        "Cache (matrix from DNG metadata): searching for an entry [<Metadata>]."
    ));

    let (idt, logs) = capture_logs(|| caches.fetch_matrix_from_metadata(&metadata, &verbose()));
    assert_eq!(idt.unwrap(), expected);
    assert!(has_line(&logs, "Cache (matrix from DNG metadata): found in cache!"));

    // Any field change is a different descriptor.
    metadata.baseline_exposure = 0.0;
    let (_, logs) = capture_logs(|| caches.fetch_matrix_from_metadata(&metadata, &verbose()));
    assert!(has_line(
        &logs,
        "Cache (matrix from DNG metadata): not found. Calculating a new entry."
    ));
    assert_eq!(caches.matrix_from_metadata.len(), 2);
}

#[test]
fn test_caches_are_independent_values() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    let mut a = TransformCaches::new();
    let mut b = TransformCaches::new();

    a.fetch_multipliers_from_illuminant(MAKE, MODEL, "d65", &mut solver, &FetchOptions::default())
        .unwrap();
    assert_eq!(a.wb_from_illuminant.len(), 1);
    assert!(b.wb_from_illuminant.is_empty());

    b.fetch_multipliers_from_illuminant(MAKE, MODEL, "d65", &mut solver, &FetchOptions::default())
        .unwrap();
    a.clear();
    assert!(a.wb_from_illuminant.is_empty());
    assert_eq!(b.wb_from_illuminant.len(), 1);
}
