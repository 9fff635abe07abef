//! Spectral solver against an on-disk database.

use approx::assert_abs_diff_eq;
use idt_core::testing::capture_logs;
use idt_core::{DataKind, IdtError};

use crate::fixtures::{OBSERVER_PATH, TRAINING_PATH, TestDatabase};

fn has_line(logs: &str, line: &str) -> bool {
    logs.lines().any(|l| l.trim() == line)
}

#[test]
fn test_idt_matrix_d65() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.loaded_solver().unwrap();
    solver.find_illuminant("D65").unwrap();
    let wb = solver.calculate_wb().unwrap();
    assert_eq!(wb.y, 1.0);

    let idt = solver.calculate_idt_matrix().unwrap();
    for i in 0..3 {
        assert_abs_diff_eq!(idt.row_sums()[i], 1.0, epsilon = 1e-9);
    }
}

#[test]
fn test_camera_lookup_ignores_case() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    solver.find_camera("BLACKMAGIC", "cinema camera").unwrap();
    assert_eq!(solver.camera().unwrap().channel_count(), 3);
}

#[test]
fn test_missing_camera() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    let err = solver.find_camera("Nope", "X").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to find spectral data for camera make: 'Nope', model: 'X'."
    );
}

#[test]
fn test_missing_data_file() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    let err = solver
        .load_spectral_data("training/nope.json", DataKind::Training)
        .unwrap_err();
    assert_eq!(err.to_string(), "Failed to find spectral data 'training/nope.json'.");
}

#[test]
fn test_absolute_data_path() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    let path = db.root().join(OBSERVER_PATH);
    solver.load_spectral_data(&path, DataKind::Cmf).unwrap();
}

#[test]
fn test_illuminant_ranges() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();

    for name in ["d30", "D260", "d3999", "d25001"] {
        let err = solver.find_illuminant(name).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The range of Correlated Color Temperature for Day Light should be from 4000 to 25000.",
            "{name}"
        );
    }
    for name in ["1000k", "4000K"] {
        let err = solver.find_illuminant(name).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The range of Color Temperature for BlackBody should be from 1500 to 3999.",
            "{name}"
        );
    }

    for name in ["d40", "D250", "d6500", "1500K", "3999k"] {
        solver.find_illuminant(name).unwrap();
    }
}

#[test]
fn test_database_illuminant() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    solver.find_illuminant("LINEAR").unwrap();
    let illuminant = solver.illuminant().unwrap();
    assert_eq!(illuminant.type_name, "linear");
    assert_eq!(illuminant.cct, None);

    let err = solver.find_illuminant("Studio").unwrap_err();
    assert_eq!(err.to_string(), "Failed to find illuminant type = 'studio'.");
}

#[test]
fn test_multi_channel_illuminant_rejected() {
    let db = TestDatabase::standard()
        .unwrap()
        .with_illuminant("broken", 2)
        .unwrap();
    let mut solver = db.solver();
    let err = solver.find_illuminant("broken").unwrap_err();
    assert!(err.is_config());
}

#[test]
fn test_four_channel_camera() {
    let db = TestDatabase::new()
        .unwrap()
        .with_camera("Acme", "Quad", &["R", "G", "B", "G2"])
        .unwrap();
    let mut solver = db.solver();
    solver.find_camera("Acme", "Quad").unwrap();

    let err = solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "camera needs to be initialised prior to calling SpectralSolver::find_illuminant()"
    );
    let err = solver.calculate_wb().unwrap_err();
    assert!(matches!(err, IdtError::Precondition { requires: "camera", .. }));
}

#[test]
fn test_preconditions_in_order() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.solver();
    let err = solver.calculate_idt_matrix().unwrap_err();
    assert_eq!(
        err.to_string(),
        "camera needs to be initialised prior to calling SpectralSolver::calculate_IDT_matrix()"
    );

    solver.find_camera(TestDatabase::MAKE, TestDatabase::MODEL).unwrap();
    solver.find_illuminant("d55").unwrap();
    let err = solver.calculate_idt_matrix().unwrap_err();
    assert_eq!(
        err.to_string(),
        "observer needs to be initialised prior to calling SpectralSolver::calculate_IDT_matrix()"
    );

    solver.load_spectral_data(OBSERVER_PATH, DataKind::Cmf).unwrap();
    let err = solver.calculate_idt_matrix().unwrap_err();
    assert_eq!(
        err.to_string(),
        "training data needs to be initialised prior to calling SpectralSolver::calculate_IDT_matrix()"
    );

    solver.load_spectral_data(TRAINING_PATH, DataKind::Training).unwrap();
    assert!(solver.calculate_idt_matrix().is_err());
    solver.calculate_wb().unwrap();
    solver.calculate_idt_matrix().unwrap();
}

#[test]
fn test_find_illuminant_from_wb() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.loaded_solver().unwrap();

    solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]).unwrap();
    assert_eq!(solver.illuminant().unwrap().type_name, "2000k");
    let wb = solver.wb_multipliers().unwrap();
    assert_eq!(wb.y, 1.0);

    solver
        .find_illuminant_from_wb(&[2.0 / 1.5, 1.0, 1.8 / 1.5])
        .unwrap();
    assert_eq!(solver.illuminant().unwrap().type_name, "1500k");

    // The detected white balance is ready for the fit.
    let idt = solver.calculate_idt_matrix().unwrap();
    assert!(idt.is_finite());
}

#[test]
fn test_wrong_multiplier_count() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.loaded_solver().unwrap();
    assert!(solver.find_illuminant_from_wb(&[1.0, 1.0]).unwrap_err().is_config());
}

#[test]
fn test_detection_message_needs_verbosity() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.loaded_solver().unwrap();
    let message = "The illuminant calculated to be the best match to the camera metadata is '2000k'.";

    let (result, logs) = capture_logs(|| solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]));
    result.unwrap();
    assert!(!has_line(&logs, message));

    solver.verbosity = 1;
    let (result, logs) = capture_logs(|| solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]));
    result.unwrap();
    assert!(has_line(&logs, message), "{logs}");
}

#[test]
fn test_summary_needs_verbosity_two() {
    let db = TestDatabase::standard().unwrap();
    let mut solver = db.loaded_solver().unwrap();
    solver.find_illuminant("d65").unwrap();
    solver.calculate_wb().unwrap();

    solver.verbosity = 1;
    let (result, logs) = capture_logs(|| solver.calculate_idt_matrix());
    result.unwrap();
    assert!(!has_line(&logs, "Solver Summary"));

    solver.verbosity = 2;
    let (result, logs) = capture_logs(|| solver.calculate_idt_matrix());
    result.unwrap();
    assert!(has_line(&logs, "Solver Summary"));
    assert!(has_line(&logs, "The IDT matrix is"));
}

#[test]
fn test_missing_kind_directory_warns() {
    let db = TestDatabase::new()
        .unwrap()
        .with_camera(TestDatabase::MAKE, TestDatabase::MODEL, &["R", "G", "B"])
        .unwrap();
    let mut solver = db.solver();
    solver.find_camera(TestDatabase::MAKE, TestDatabase::MODEL).unwrap();

    let (result, logs) = capture_logs(|| solver.find_illuminant_from_wb(&[1.5, 1.0, 1.2]));
    result.unwrap();
    assert_eq!(solver.illuminant().map(|i| i.type_name.as_str()), Some("2000k"));
    let expected = format!(
        "Directory '{}' does not exist.",
        db.root().join("illuminant").display()
    );
    assert!(has_line(&logs, &expected), "{logs}");
}

#[test]
fn test_file_search_path_warns() {
    let db = TestDatabase::standard().unwrap();
    let file = db.root().join(OBSERVER_PATH);
    let solver = idt_core::SpectralSolver::new(vec![file.clone(), db.root().to_path_buf()]);

    let (cameras, logs) = capture_logs(|| solver.list_cameras());
    assert_eq!(cameras, ["Blackmagic / Cinema Camera"]);
    let expected = format!("Database location '{}' is not a directory.", file.display());
    assert!(has_line(&logs, &expected), "{logs}");
}

#[test]
fn test_unparsable_file_is_skipped() {
    let db = TestDatabase::standard().unwrap();
    db.write_raw(DataKind::Camera, "aaa_broken.json", "{ not json").unwrap();
    let mut solver = db.solver();
    solver.find_camera(TestDatabase::MAKE, TestDatabase::MODEL).unwrap();
}

#[test]
fn test_listings() {
    let db = TestDatabase::standard()
        .unwrap()
        .with_camera("Acme", "One", &["R", "G", "B"])
        .unwrap();
    let solver = db.solver();
    assert_eq!(
        solver.list_cameras(),
        ["Acme / One", "Blackmagic / Cinema Camera"]
    );
    assert_eq!(
        solver.list_illuminants(),
        [
            "Day-light (e.g., D60, D6025)",
            "Blackbody (e.g., 3200K)",
            "linear"
        ]
    );
}
