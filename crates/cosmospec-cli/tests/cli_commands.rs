use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Per-bin `dN/dE` that moves one particle from bin `i` into bin `i - 1`
/// on the grid [1, 2, 4, 8], whose number weights are `E ln 2`.
const SHIFT_DOWN_MATRIX: &str = r#"[
    [0.0, 0.0, 0.0, 0.0],
    [1.4426950408889634, 0.0, 0.0, 0.0],
    [0.0, 0.7213475204444817, 0.0, 0.0],
    [0.0, 0.0, 0.36067376022224085, 0.0]
]"#;

#[test]
fn grid_command_prints_centers_and_boundaries() {
    let output = run_cosmospec(&["grid", "--low", "1", "--high", "100", "--count", "3"]);
    assert_success(&output);

    let report = parse_stdout(&output);
    let centers = float_array(&report["centers"]);
    let boundaries = float_array(&report["boundaries"]);
    let widths = float_array(&report["logBinWidths"]);

    assert_eq!(centers.len(), 3);
    assert_eq!(boundaries.len(), 4);
    assert_eq!(widths.len(), 3);
    assert_close(centers[1], 10.0, 1.0e-12);
    assert_close(boundaries[1], 10.0_f64.sqrt(), 1.0e-12);
    assert_close(boundaries[0], 10.0_f64.powf(-0.5), 1.0e-12);
    for width in widths {
        assert_close(width, 10.0_f64.ln(), 1.0e-12);
    }
}

#[test]
fn grid_command_rejects_single_bin() {
    let output = run_cosmospec(&["grid", "--low", "1", "--high", "100", "--count", "1"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("INPUT.INSUFFICIENT_BINS"),
        "stderr should name the failure, got: {stderr}"
    );
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn discretize_command_conserves_integrated_number_and_energy() {
    let output = run_cosmospec(&[
        "discretize", "--low", "1", "--high", "100", "--count", "21", "--norm", "2",
    ]);
    assert_success(&output);

    let report = parse_stdout(&output);
    assert_close(report["totalNumber"].as_f64().expect("totalNumber"), 198.0, 1.0e-9);
    assert_close(report["totalEnergy"].as_f64().expect("totalEnergy"), 9999.0, 1.0e-9);
    assert_eq!(report["underflowNumber"].as_f64(), Some(0.0));
    assert_eq!(report["redshift"].as_f64(), Some(-1.0));
    assert_eq!(float_array(&report["dnde"]).len(), 21);
}

#[test]
fn discretize_command_accepts_negative_power_and_config_file() {
    let temp = TempDir::new().expect("tempdir should be created");
    let config_path = temp.path().join("engine.json");
    write_file(&config_path, r#"{ "integration": { "relTol": 1e-8 } }"#);

    let output = run_cosmospec(&[
        "discretize",
        "--low",
        "1",
        "--high",
        "1000",
        "--count",
        "31",
        "--power",
        "-2",
        "--config",
        config_path.to_str().expect("utf-8 path"),
    ]);
    assert_success(&output);

    let report = parse_stdout(&output);
    let total_number = report["totalNumber"].as_f64().expect("totalNumber");
    let total_energy = report["totalEnergy"].as_f64().expect("totalEnergy");
    assert_close(total_number, 1.0 - 1.0e-3, 1.0e-6);
    assert_close(total_energy, 1000.0_f64.ln(), 1.0e-6);
}

#[test]
fn discretize_command_reports_unreadable_config_as_io_failure() {
    let temp = TempDir::new().expect("tempdir should be created");
    let missing = temp.path().join("absent.json");

    let output = run_cosmospec(&[
        "discretize",
        "--low",
        "1",
        "--high",
        "10",
        "--count",
        "5",
        "--config",
        missing.to_str().expect("utf-8 path"),
    ]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO.CLI"));
}

#[test]
fn rebin_command_places_counts_on_matching_centers() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("rebin.json");
    write_file(
        &request,
        r#"{ "counts": [1.0, 2.0], "inEng": [2.0, 4.0], "outEng": [1.0, 2.0, 4.0, 8.0] }"#,
    );

    let output = run_cosmospec(&["rebin", request.to_str().expect("utf-8 path")]);
    assert_success(&output);

    let report = parse_stdout(&output);
    assert_close(report["totalNumber"].as_f64().expect("totalNumber"), 3.0, 1.0e-12);
    assert_close(report["totalEnergy"].as_f64().expect("totalEnergy"), 10.0, 1.0e-12);
    assert_eq!(report["underflowNumber"].as_f64(), Some(0.0));
    let dnde = float_array(&report["dnde"]);
    assert_eq!(dnde[0], 0.0);
    assert_eq!(dnde[3], 0.0);
}

#[test]
fn rebin_command_rejects_input_above_target_grid() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("rebin.json");
    write_file(
        &request,
        r#"{ "counts": [1.0, 1.0], "inEng": [2.0, 16.0], "outEng": [1.0, 2.0, 4.0, 8.0] }"#,
    );

    let output = run_cosmospec(&["rebin", request.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(4));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("RUN.OVERFLOW_NOT_SUPPORTED"),
        "stderr should name the failure, got: {stderr}"
    );
    assert!(stderr.contains("FATAL EXIT CODE: 4"));
}

#[test]
fn rebin_command_rejects_malformed_request() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("rebin.json");
    write_file(&request, r#"{ "counts": [1.0], "inEng": [2.0] }"#);

    let output = run_cosmospec(&["rebin", request.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.CLI_REQUEST"));
}

#[test]
fn evolve_command_consumes_full_sequence_without_target() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("evolve.json");
    write_evolve_request(&request, "[0.0, 0.0, 0.0, 8.0]", SHIFT_DOWN_MATRIX);

    let output = run_cosmospec(&["evolve", request.to_str().expect("utf-8 path")]);
    assert_success(&output);

    let report = parse_stdout(&output);
    assert_eq!(report["redshift"].as_f64(), Some(80.0));
    assert_close(report["totalNumber"].as_f64().expect("totalNumber"), 8.0, 1.0e-9);
    assert_close(report["totalEnergy"].as_f64().expect("totalEnergy"), 16.0, 1.0e-9);
}

#[test]
fn evolve_command_records_history_up_to_target_redshift() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("evolve.json");
    write_evolve_request(&request, "[0.0, 0.0, 0.0, 8.0]", SHIFT_DOWN_MATRIX);

    let output = run_cosmospec(&[
        "evolve",
        request.to_str().expect("utf-8 path"),
        "--end-redshift",
        "85",
        "--record",
    ]);
    assert_success(&output);

    let history = parse_stdout(&output);
    let entries = history.as_array().expect("history should be an array");
    let redshifts: Vec<f64> = entries
        .iter()
        .map(|entry| entry["redshift"].as_f64().expect("redshift"))
        .collect();
    assert_eq!(redshifts, vec![100.0, 90.0]);
    assert_close(
        entries[1]["totalEnergy"].as_f64().expect("totalEnergy"),
        32.0,
        1.0e-9,
    );
}

#[test]
fn evolve_command_rejects_matrix_of_wrong_shape() {
    let temp = TempDir::new().expect("tempdir should be created");
    let request = temp.path().join("evolve.json");
    write_evolve_request(&request, "[0.0, 0.0, 0.0, 8.0]", "[[1.0, 0.0], [0.0, 1.0]]");

    let output = run_cosmospec(&["evolve", request.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("INPUT.SHAPE_MISMATCH"));
}

#[test]
fn evolve_command_reports_missing_request_as_io_failure() {
    let temp = TempDir::new().expect("tempdir should be created");
    let missing = temp.path().join("absent.json");

    let output = run_cosmospec(&["evolve", missing.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO.CLI"));
}

fn run_cosmospec(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cosmospec"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("cosmospec should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn parse_stdout(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn float_array(value: &Value) -> Vec<f64> {
    value
        .as_array()
        .expect("value should be an array")
        .iter()
        .map(|entry| entry.as_f64().expect("entry should be a number"))
        .collect()
}

fn assert_close(actual: f64, expected: f64, rel_tol: f64) {
    let scale = expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= rel_tol * scale,
        "expected {expected}, got {actual}"
    );
}

fn write_evolve_request(path: &Path, counts: &str, matrix: &str) {
    let body = format!(
        r#"{{
            "grid": [1.0, 2.0, 4.0, 8.0],
            "counts": {counts},
            "operators": [
                {{ "redshift": 100.0, "matrix": {matrix}, "dlnz": 0.1 }},
                {{ "redshift": 90.0, "matrix": {matrix}, "dlnz": 0.1 }},
                {{ "redshift": 80.0, "matrix": {matrix}, "dlnz": 0.1 }}
            ]
        }}"#
    );
    write_file(path, &body);
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
}
