use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

const RESULTS: &str = r#"{
    "elements": ["Si", "Al"],
    "models": {
        "model1": {
            "kind": "scheil",
            "steps": [0, 1, 2],
            "parameters": {
                "temperature": [1500, 1400, 1300],
                "phase_fraction": { "liquid": [1.0, 0.5, 0.0], "solid": [0.0, 0.5, 1.0] }
            }
        },
        "eq": {
            "kind": "equilibrium",
            "parameters": {
                "temperature": [700, 600],
                "system": { "pressure": [101325, 202650] }
            }
        },
        "ragged": {
            "kind": "scheil",
            "parameters": {
                "temperature": { "steps": [0, 1, 2], "values": [700, 650, 600] },
                "phase_fraction": { "LIQUID": { "steps": [0, 1, 3], "values": [1.0, 0.5, 0.0] } }
            }
        }
    }
}"#;

const STUDY: &str = r#"{
    "study": {
        "coords": { "phase": { "data": ["LIQUID", "FCC_A1"] } },
        "data_vars": {
            "temperature_values": { "data": [
                [[650.0, 923.15, 1202.0], [600.0, 873.15, 1112.0]],
                [[640.0, 913.15, 1184.0], [590.0, 863.15, 1094.0]]
            ] },
            "phase_fraction": { "data": [
                [[[1.0, 1.0], [0.0, 0.0]], [[0.3, 0.31], [0.7, 0.69]]],
                [[[1.0, 1.0], [0.0, 0.0]], [[0.2, 0.21], [0.8, 0.79]]]
            ] }
        },
        "attrs": { "input_dict": { "composition": { "components": [
            { "name": "Al", "samples": [95.0, 90.0] },
            { "name": "Mg", "samples": [5.0, 10.0] }
        ] } } }
    }
}"#;

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("{}_{}", prefix, nanos));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn fixture(prefix: &str) -> (PathBuf, PathBuf) {
    fixture_with(prefix, RESULTS)
}

fn fixture_with(prefix: &str, contents: &str) -> (PathBuf, PathBuf) {
    let dir = unique_temp_dir(prefix);
    let path = dir.join("results.json");
    fs::write(&path, contents).expect("failed to write fixture");
    (dir, path)
}

fn icmd(args: &[&str], results: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_icmd"))
        .args(&args[..1])
        .arg(results)
        .args(&args[1..])
        .output()
        .expect("failed to run icmd")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn models_lists_summaries() {
    let (_dir, results) = fixture("icmd_cli_models");
    let output = icmd(&["models"], &results);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("model1 - scheil (3 steps, 3 parameters)"));
    assert!(text.contains("eq - equilibrium (2 steps, 2 parameters)"));
}

#[test]
fn elements_are_sorted() {
    let (_dir, results) = fixture("icmd_cli_elements");
    let output = icmd(&["elements"], &results);
    assert_eq!(stdout(&output), "Al\nSi\n");
}

#[test]
fn scheil_prints_csv_and_writes_plot() {
    let (dir, results) = fixture("icmd_cli_scheil");
    let plot = dir.join("scheil.html");
    let plot_arg = plot.to_string_lossy().into_owned();
    let output = icmd(&["scheil", "model1", "--plot", &plot_arg], &results);
    assert!(output.status.success());

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        vec![
            "step,Temperature in C,Fraction solid,Phase Region,liquid,solid",
            "0,1500,0,liquid,1,0",
            "1,1400,0.5,liquid+solid,0.5,0.5",
            "2,1300,1,solid,0,1",
        ]
    );
    assert!(plot.exists());
}

#[test]
fn dropped_steps_are_reported_under_quiet_file_export() {
    let (dir, results) = fixture("icmd_cli_ragged_file");
    let csv = dir.join("phases.csv");
    let csv_arg = csv.to_string_lossy().into_owned();
    let output = icmd(&["phases", "ragged", "--quiet", "-o", &csv_arg], &results);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains("Exported 2 rows"));
    assert!(text.contains("Dropped 2 steps: step 2 (no phase data), step 3 (no temperature)"));
    assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 3);
}

#[test]
fn dropped_steps_are_reported_under_quiet_stdout_export() {
    let (_dir, results) = fixture("icmd_cli_ragged_stdout");
    let output = icmd(&["scheil", "ragged", "--quiet"], &results);
    assert!(output.status.success());

    assert_eq!(stdout(&output).lines().count(), 3);
    let err = stderr(&output);
    assert!(err.contains("Note: Dropped 2 steps"));
    // --quiet still silences the log warning itself.
    assert!(!err.contains("WARN"));
}

#[test]
fn complete_tables_report_nothing() {
    let (_dir, results) = fixture("icmd_cli_complete");
    let output = icmd(&["phases", "model1"], &results);
    assert!(output.status.success());
    assert!(!stderr(&output).contains("Dropped"));
}

#[test]
fn study_slice_writes_nearest_sample_and_titled_chart() {
    let (dir, results) = fixture_with("icmd_cli_study", STUDY);
    let plot = dir.join("study.html");
    let plot_arg = plot.to_string_lossy().into_owned();
    let output = icmd(
        &["study", "study", "--at", "Mg=9", "--balance", "Al", "--plot", &plot_arg],
        &results,
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "step,Temperature in C,LIQUID,FCC_A1");
    assert_eq!(lines[2], "1,590,0.2,0.8");
    let html = fs::read_to_string(&plot).unwrap();
    assert!(html.contains("Composition: Mg=9.00"));
}

#[test]
fn study_without_target_lists_every_sample() {
    let (_dir, results) = fixture_with("icmd_cli_study_all", STUDY);
    let output = icmd(&["study", "study", "--basis", "mass"], &results);
    assert!(output.status.success(), "{}", stderr(&output));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "sample,Al,Mg,step,Temperature in C,LIQUID,FCC_A1");
    assert_eq!(lines[4], "1,90,10,1,590,0.21,0.79");
}

#[test]
fn components_leave_out_the_balance() {
    let (_dir, results) = fixture_with("icmd_cli_components", STUDY);
    let output = icmd(&["components", "study", "--exclude", "Al"], &results);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "sample,Mg\n0,5\n1,10\n");
}

#[test]
fn pressure_in_atm_to_file() {
    let (dir, results) = fixture("icmd_cli_property");
    let csv = dir.join("pressure.csv");
    let csv_arg = csv.to_string_lossy().into_owned();
    let output = icmd(
        &["property", "eq", "pressure", "--pressure-unit", "atm", "-o", &csv_arg],
        &results,
    );
    assert!(output.status.success());

    let text = fs::read_to_string(&csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("step,Pressure in atm"));
    let values: Vec<f64> = lines
        .map(|line| line.split(',').nth(1).unwrap().parse().unwrap())
        .collect();
    assert_eq!(values.len(), 2);
    assert!((values[0] - 1.0).abs() < 1e-9);
    assert!((values[1] - 2.0).abs() < 1e-9);
}

#[test]
fn unknown_model_fails_with_message() {
    let (_dir, results) = fixture("icmd_cli_missing");
    let output = icmd(&["scheil", "nope"], &results);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Model not found: nope"));
}
