// Checks on the files the binary expects next to it.

use std::path::Path;

/// The shipped default config is valid TOML with at least one shape.
#[test]
fn default_config_is_valid_toml() {
    let content =
        std::fs::read_to_string("defaults/lineup.toml").expect("defaults/lineup.toml should exist");
    let parsed: toml::Value = toml::from_str(&content).expect("defaults/lineup.toml is not valid TOML");
    let shapes = parsed
        .get("shapes")
        .and_then(|s| s.as_table())
        .expect("defaults/lineup.toml should define [shapes.*]");
    assert!(!shapes.is_empty());
}

#[test]
fn fixtures_exist() {
    for file in ["tests/fixtures/draftkings.csv", "tests/fixtures/playoff.csv"] {
        assert!(Path::new(file).is_file(), "Expected fixture '{}' to exist", file);
    }
}
