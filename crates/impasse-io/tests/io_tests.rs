//! Integration tests for impasse-io.

use std::path::{Path, PathBuf};

use impasse_contact::{BarrierType, DetectionMethod, TrajectoryType};
use impasse_io::settings::to_string;
use impasse_io::{
    from_json_str, from_toml_str, load_settings, save_settings, validate_settings, SettingsFormat,
    SimulationSettings,
};
use impasse_types::ImpasseError;

fn scratch_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("impasse-io-{}-{name}", std::process::id()))
}

// ─── Parsing Tests ────────────────────────────────────────────

#[test]
fn empty_documents_take_defaults() {
    assert_eq!(from_json_str("{}").unwrap(), SimulationSettings::default());
    assert_eq!(from_toml_str("").unwrap(), SimulationSettings::default());
}

#[test]
fn json_settings_parse() {
    let settings = from_json_str(
        r#"{
            "distance_barrier_constraint": {
                "initial_barrier_activation_distance": 0.01,
                "barrier_type": "spline",
                "trajectory_type": "piecewise_linear"
            },
            "barrier_problem": { "barrier_stiffness": 50.0 }
        }"#,
    )
    .unwrap();
    let constraint = &settings.distance_barrier_constraint;
    assert_eq!(constraint.initial_barrier_activation_distance, 0.01);
    assert_eq!(constraint.minimum_separation_distance, 0.0);
    assert_eq!(constraint.barrier_type, BarrierType::Spline);
    assert_eq!(constraint.trajectory_type, TrajectoryType::PiecewiseLinear);
    assert_eq!(settings.barrier_problem.barrier_stiffness, 50.0);
}

#[test]
fn toml_settings_parse() {
    let settings = from_toml_str(
        r#"
        [distance_barrier_constraint]
        minimum_separation_distance = 1e-4
        barrier_type = "poly_log"
        detection_method = "brute_force"

        [barrier_problem]
        termination_threshold = 1e-8
        "#,
    )
    .unwrap();
    assert_eq!(settings.distance_barrier_constraint.minimum_separation_distance, 1e-4);
    assert_eq!(settings.distance_barrier_constraint.barrier_type, BarrierType::PolyLog);
    assert_eq!(settings.distance_barrier_constraint.detection_method, DetectionMethod::BruteForce);
    assert_eq!(settings.barrier_problem.termination_threshold, 1e-8);
}

#[test]
fn unknown_barrier_family_is_rejected() {
    let err = from_json_str(r#"{ "distance_barrier_constraint": { "barrier_type": "log" } }"#)
        .unwrap_err();
    assert!(matches!(err, ImpasseError::Serialization(_)));
    assert!(from_toml_str("barrier_problem = 3").is_err());
}

#[test]
fn toml_output_parses_back() {
    let mut settings = SimulationSettings::default();
    settings.distance_barrier_constraint.barrier_type = BarrierType::Spline;
    settings.barrier_problem.barrier_stiffness = 1e3;
    let text = to_string(&settings, SettingsFormat::Toml).unwrap();
    assert!(text.contains("[distance_barrier_constraint]"));
    assert_eq!(from_toml_str(&text).unwrap(), settings);
}

// ─── Validator Tests ──────────────────────────────────────────

#[test]
fn default_settings_are_valid() {
    assert!(validate_settings(&SimulationSettings::default()).is_ok());
}

#[test]
fn out_of_range_values_are_rejected() {
    let cases: [(fn(&mut SimulationSettings), &str); 5] = [
        (
            |s| s.distance_barrier_constraint.initial_barrier_activation_distance = 0.0,
            "distance_barrier_constraint.initial_barrier_activation_distance",
        ),
        (
            |s| s.distance_barrier_constraint.minimum_separation_distance = -1e-3,
            "distance_barrier_constraint.minimum_separation_distance",
        ),
        (
            |s| s.barrier_problem.barrier_stiffness = 0.0,
            "barrier_problem.barrier_stiffness",
        ),
        (
            |s| s.barrier_problem.termination_threshold = f64::NAN,
            "barrier_problem.termination_threshold",
        ),
        (
            |s| s.barrier_problem.finite_difference_step = -1e-7,
            "barrier_problem.finite_difference_step",
        ),
    ];
    for (mutate, key) in cases {
        let mut settings = SimulationSettings::default();
        mutate(&mut settings);
        let err = validate_settings(&settings).unwrap_err();
        match err {
            ImpasseError::InvalidConfig(message) => assert!(message.starts_with(key), "{message}"),
            other => panic!("expected InvalidConfig, got {other}"),
        }
    }
}

// ─── File Tests ───────────────────────────────────────────────

#[test]
fn format_follows_extension() {
    assert_eq!(SettingsFormat::from_path(Path::new("a.json")).unwrap(), SettingsFormat::Json);
    assert_eq!(SettingsFormat::from_path(Path::new("a.TOML")).unwrap(), SettingsFormat::Toml);
    assert!(SettingsFormat::from_path(Path::new("a.yaml")).is_err());
    assert!(SettingsFormat::from_path(Path::new("settings")).is_err());
}

#[test]
fn save_and_load_both_formats() {
    let mut settings = SimulationSettings::default();
    settings.distance_barrier_constraint.initial_barrier_activation_distance = 5e-3;
    settings.barrier_problem.barrier_stiffness = 10.0;

    for ext in ["json", "toml"] {
        let path = scratch_path(&format!("roundtrip.{ext}"));
        save_settings(&settings, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }
}

#[test]
fn load_rejects_invalid_file_contents() {
    let path = scratch_path("invalid.json");
    std::fs::write(&path, r#"{ "barrier_problem": { "barrier_stiffness": -1.0 } }"#).unwrap();
    assert!(matches!(load_settings(&path), Err(ImpasseError::InvalidConfig(_))));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn load_missing_file_is_io_error() {
    let path = scratch_path("missing.toml");
    assert!(matches!(load_settings(&path), Err(ImpasseError::Io(_))));
}
