use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use icmd_core::{FractionBasis, TemperatureUnit};
use icmd_document::{DocumentError, LoadOptions, ValidationError, load_document, load_document_with};

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

#[test]
fn load_from_disk_lists_models_in_source_order() {
    let dir = unique_temp_dir("icmd_document_load");
    let path = dir.join("results.json");
    fs::write(
        &path,
        r#"{
            "elements": ["Al", "Cu"],
            "models": {
                "zeta": { "parameters": { "temperature": [700, 650] } },
                "alpha": { "parameters": { "temperature": [800] } },
                "mid": { "parameters": {} }
            }
        }"#,
    )
    .expect("failed to write fixture");

    let doc = load_document(&path).expect("failed to load document");
    let names: Vec<&str> = doc.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert!(doc.model("mid").unwrap().parameters.is_empty());
}

#[test]
fn malformed_parameter_fails_at_load() {
    let dir = unique_temp_dir("icmd_document_malformed");
    let path = dir.join("bad.json");
    fs::write(
        &path,
        r#"{"models": {"m": {"parameters": {"temperature": "hot"}}}}"#,
    )
    .expect("failed to write fixture");

    let err = load_document(&path).unwrap_err();
    match err {
        DocumentError::Validation(ValidationError::InvalidType { path, .. }) => {
            assert_eq!(path, "$.models.m.parameters.temperature");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_json_file_is_a_parse_error() {
    let dir = unique_temp_dir("icmd_document_not_json");
    let path = dir.join("notes.json");
    fs::write(&path, "model1: 1500 C").expect("failed to write fixture");

    assert!(matches!(
        load_document(&path),
        Err(DocumentError::Json { .. })
    ));
}

#[test]
fn tool_dataset_file_loads_with_column_choices() {
    let dir = unique_temp_dir("icmd_document_dataset");
    let path = dir.join("scheil.json");
    fs::write(
        &path,
        r#"{
            "scheil": {
                "coords": { "phase": { "data": ["LIQUID", "FCC_A1"] } },
                "data_vars": {
                    "temperature": { "data": [
                        [[660.0, 933.15, 1220.0]],
                        [[640.0, 913.15, 1184.0]]
                    ] },
                    "phase_fraction": { "data": [[
                        [[1.0, 1.0], [0.0, 0.0]],
                        [[0.7, 0.72], [0.3, 0.28]]
                    ]] }
                }
            }
        }"#,
    )
    .expect("failed to write fixture");

    let doc = load_document(&path).expect("default columns");
    let model = doc.model("scheil").unwrap();
    assert_eq!(model.phases, vec!["LIQUID", "FCC_A1"]);
    assert_eq!(model.parameter("temperature").unwrap().value_at(1), Some(640.0));
    assert_eq!(
        model.parameter("phase_fraction.FCC_A1").unwrap().value_at(1),
        Some(0.3)
    );

    let options = LoadOptions {
        basis: FractionBasis::Mass,
        temperature_column: TemperatureUnit::Kelvin,
    };
    let doc = load_document_with(&path, &options).expect("mass and kelvin columns");
    let model = doc.model("scheil").unwrap();
    assert_eq!(model.units.temperature, TemperatureUnit::Kelvin);
    assert_eq!(model.parameter("temperature").unwrap().value_at(0), Some(933.15));
    assert_eq!(
        model.parameter("phase_fraction.FCC_A1").unwrap().value_at(1),
        Some(0.28)
    );
}
