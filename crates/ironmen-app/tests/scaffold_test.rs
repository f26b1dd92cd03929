// Checks on the files shipped alongside the binary.

use std::path::Path;

/// Verify that defaults/pipeline.toml is valid TOML.
#[test]
fn pipeline_toml_is_valid() {
    let content =
        std::fs::read_to_string("defaults/pipeline.toml").expect("defaults/pipeline.toml should exist");
    let parsed: Result<toml::Value, _> = toml::from_str(&content);
    assert!(parsed.is_ok(), "defaults/pipeline.toml is not valid TOML: {:?}", parsed.err());
}

/// Verify that the shipped model section passes validation.
#[test]
fn pipeline_toml_model_section_validates() {
    let content = std::fs::read_to_string("defaults/pipeline.toml").unwrap();
    let value: toml::Value = toml::from_str(&content).unwrap();
    let model: ironmen_core::config::ModelConfig = value
        .get("model")
        .cloned()
        .expect("[model] section should exist")
        .try_into()
        .expect("[model] section should deserialize");
    assert!(model.validate().is_ok(), "{:?}", model.validate());
    assert_eq!(model.availability.weights, vec![0.60, 0.30, 0.10]);
}

/// Verify that all expected fixture files exist.
#[test]
fn fixture_files_exist() {
    let expected = [
        "tests/fixtures/season_totals.csv",
        "tests/fixtures/roster.csv",
        "tests/fixtures/draft_analysis.csv",
    ];
    for file in expected {
        assert!(Path::new(file).is_file(), "Expected fixture '{}' to exist", file);
    }
}
