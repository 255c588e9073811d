//! Layered configuration: CLI arguments > environment > config file > defaults

use proxima_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use proxima_core::models::{Coordinates, StreetFormat, Units};
use proxima_core::ProximaError;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

const ENV_VARS: [&str; 7] = [
    "PROXIMA_DEFAULT_LAT",
    "PROXIMA_DEFAULT_LNG",
    "PROXIMA_DEFAULT_RANGE",
    "PROXIMA_DEFAULT_UNITS",
    "PROXIMA_SUBFIELDS",
    "PROXIMA_FOCUSED_TYPES",
    "PROXIMA_GOOGLE_API_KEY",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_file_with_street_formats() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_lat = 30.2672
default_lng = -97.7431
default_units = "km"
focused_types = ["premise", "route"]

[street_formats]
Spain = "name_comma_number"
Mexico = "name_first"
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.default_coordinates(), Coordinates::new(30.2672, -97.7431));
    assert_eq!(config.default_units.value, Units::Kilometers);
    assert_eq!(config.default_units.source, ConfigSource::File);
    assert_eq!(config.focused_types.value, vec!["premise", "route"]);
    assert_eq!(
        config.street_formats.value.get("Spain"),
        Some(&StreetFormat::NameCommaNumber)
    );
    assert_eq!(config.street_formats.value.len(), 2);
    // Untouched keys keep their defaults
    assert_eq!(config.default_range.source, ConfigSource::Default);
    assert_eq!(config.subfields.source, ConfigSource::Default);
}

#[test]
fn test_file_rejects_unknown_street_format() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[street_formats]\nSpain = \"upside_down\"").unwrap();

    let err = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ProximaError::ConfigInvalid { .. }));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("proxima.toml");

    let err = LayeredConfig::with_defaults().load_from_file(&missing).unwrap_err();
    assert!(matches!(err, ProximaError::ConfigFileNotFound { .. }));
    assert!(err.is_configuration_error());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("PROXIMA_DEFAULT_RANGE", "25");
    env::set_var("PROXIMA_SUBFIELDS", "city, state ,zip");
    env::set_var("PROXIMA_GOOGLE_API_KEY", "env-key");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "default_range = 100\ngoogle_api_key = \"file-key\"").unwrap();

    let config = LayeredConfig::with_defaults()
        .load_from_file(file.path())
        .unwrap()
        .load_from_env();

    assert_eq!(config.default_range.value, 25.0);
    assert_eq!(config.default_range.source, ConfigSource::Environment);
    assert_eq!(config.subfields.value, vec!["city", "state", "zip"]);
    assert_eq!(config.google_api_key.value.as_deref(), Some("env-key"));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("PROXIMA_DEFAULT_LAT", "95");
    env::set_var("PROXIMA_DEFAULT_UNITS", "furlongs");
    env::set_var("PROXIMA_DEFAULT_RANGE", "-3");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.default_lat.source, ConfigSource::Default);
    assert_eq!(config.default_units.value, Units::Miles);
    assert_eq!(config.default_range.value, 500.0);

    clear_env();
}

#[test]
fn test_invalid_cli_values_are_rejected() {
    let mut config = LayeredConfig::with_defaults();

    for range in [0.0, -5.0, f64::NAN] {
        let err = config
            .update_from_cli(CliConfigOverrides {
                default_range: Some(range),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.is_configuration_error());
    }
    assert_eq!(config.default_range.value, 500.0);
    assert_eq!(config.default_range.source, ConfigSource::Default);

    let err = config
        .update_from_cli(CliConfigOverrides {
            default_lat: Some(999.0),
            default_lng: Some(-97.0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ProximaError::ConfigInvalid { ref key, .. } if key == "default_lat"));
    assert_eq!(config.default_lng.source, ConfigSource::Default);

    let err = config
        .update_from_cli(CliConfigOverrides {
            default_lng: Some(181.0),
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, ProximaError::ConfigInvalid { ref key, .. } if key == "default_lng"));
}

#[test]
#[serial]
fn test_full_configuration_workflow() {
    clear_env();

    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("proxima.toml");
    fs::write(
        &config_path,
        r#"
default_lat = 51.5
default_lng = -0.12
default_range = 50
default_units = "kilometers"
"#,
    )
    .unwrap();

    env::set_var("PROXIMA_DEFAULT_UNITS", "mi");

    let mut config = LayeredConfig::with_defaults()
        .load_from_file(&config_path)
        .unwrap()
        .load_from_env();

    assert_eq!(config.default_lat.source, ConfigSource::File);
    assert_eq!(config.default_units.value, Units::Miles);
    assert_eq!(config.default_units.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides {
        default_range: Some(5.0),
        google_api_key: Some("cli-key".to_string()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.default_range.value, 5.0);
    assert_eq!(config.default_range.source, ConfigSource::Cli);
    assert_eq!(config.default_units.source, ConfigSource::Environment);

    let inspection = config.to_inspection_map();
    assert_eq!(inspection["google_api_key"], ("set".to_string(), ConfigSource::Cli));
    assert_eq!(inspection["default_lat"].1, ConfigSource::File);

    clear_env();
}
