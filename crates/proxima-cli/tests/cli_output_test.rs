//! Integration tests for the `proxima` binary
//!
//! These run the built binary from an empty working directory so no
//! `proxima.toml` or `PROXIMA_*` variable leaks into the results.

use serde_json::{json, Value};
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn proxima(dir: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_proxima"));
    command.current_dir(dir).args(args).env("RUST_LOG", "error");
    for (key, _) in std::env::vars() {
        if key.starts_with("PROXIMA_") {
            command.env_remove(key);
        }
    }
    command.output().expect("Failed to execute command")
}

fn stdout_json(output: &Output) -> Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("Output should be valid JSON")
}

/// A coarse result, too broad to be used without a fallback filter
fn austin_result() -> Value {
    json!({
        "types": ["administrative_area_level_1", "political"],
        "address_components": [
            {"long_name": "Austin", "short_name": "Austin", "types": ["locality", "political"]},
            {"long_name": "Texas", "short_name": "TX", "types": ["administrative_area_level_1", "political"]},
            {"long_name": "United States", "short_name": "US", "types": ["country", "political"]}
        ],
        "geometry": {"location": {"lat": 30.2672, "lng": -97.7431}}
    })
}

fn write_dataset(dir: &Path) {
    let rows = json!([
        {"element_id": 1, "field_id": 1, "city": "Austin", "state": "TX",
         "lat": 30.2672, "lng": -97.7431, "content": {"field_serviceRadius": 5.0}},
        {"element_id": 2, "field_id": 1, "city": "Round Rock", "state": "TX",
         "lat": 30.5083, "lng": -97.6789, "content": {"field_serviceRadius": 5.0}},
        {"element_id": 3, "field_id": 1, "city": "Dallas", "state": "TX",
         "lat": 32.7767, "lng": -96.7970},
        {"element_id": 4, "field_id": 2, "city": "Austin", "state": "TX",
         "lat": 30.2672, "lng": -97.7431}
    ]);
    std::fs::write(dir.join("rows.json"), rows.to_string()).unwrap();
    std::fs::write(dir.join("fixtures.json"), json!({ "Austin": austin_result() }).to_string())
        .unwrap();
}

#[test]
fn test_search_json_output() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());

    let output = proxima(
        dir.path(),
        &[
            "search",
            "rows.json",
            "--target",
            "austin",
            "--range",
            "50",
            "--geocode-fixtures",
            "fixtures.json",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    assert_eq!(parsed["status"], "success");
    assert_eq!(parsed["data"]["total"], 2);

    let ids: Vec<u64> = parsed["data"]["hits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["element_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(parsed["data"]["plan"]["resolution"]["source"], "geocoded");
}

#[test]
fn test_search_fallback_narrows_to_city() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());

    let output = proxima(
        dir.path(),
        &[
            "search",
            "rows.json",
            "--options",
            r#"{"target": "Austin", "subfields": "fallback"}"#,
            "--geocode-fixtures",
            "fixtures.json",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    assert_eq!(parsed["data"]["plan"]["subfields"], json!({"city": "Austin"}));
    assert_eq!(parsed["data"]["total"], 1);
}

#[test]
fn test_search_reverse_radius_on_unknown_field_fails() {
    let dir = TempDir::new().unwrap();
    write_dataset(dir.path());

    let output = proxima(
        dir.path(),
        &["search", "rows.json", "--near", "30.2672,-97.7431", "--reverse-radius", "radiusMiles"],
    );
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid reverse radius field"));
    assert!(stderr.contains("\"radiusMiles\" field does not exist"));
}

#[test]
fn test_sql_postgres_output() {
    let dir = TempDir::new().unwrap();

    let output = proxima(
        dir.path(),
        &[
            "sql",
            "--dialect",
            "postgres",
            "--near",
            "30.2672,-97.7431",
            "--range",
            "25",
            "--subfield",
            "state=TX",
            "--json",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    assert_eq!(parsed["data"]["dialect"], "postgres");
    let sql = parsed["data"]["sql"].as_str().unwrap();
    assert!(sql.contains(") AS subquery WHERE subquery.\"distance\" <= $"));
    assert!(parsed["data"]["params"].as_array().unwrap().contains(&json!("TX")));
    assert!(parsed["data"].get("rows").is_none());
}

#[test]
fn test_sql_execute_requires_postgres() {
    let dir = TempDir::new().unwrap();

    let output = proxima(dir.path(), &["sql", "--near", "30,-97", "--execute"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Only PostgreSQL queries can be executed"));
}

#[test]
fn test_normalize_full_response() {
    let dir = TempDir::new().unwrap();
    let response = json!({
        "status": "OK",
        "results": [{
            "types": ["street_address"],
            "address_components": [
                {"long_name": "1600", "short_name": "1600", "types": ["street_number"]},
                {"long_name": "Amphitheatre Parkway", "short_name": "Amphitheatre Pkwy", "types": ["route"]},
                {"long_name": "Mountain View", "short_name": "Mountain View", "types": ["locality", "political"]},
                {"long_name": "United States", "short_name": "US", "types": ["country", "political"]},
                {"long_name": "94043", "short_name": "94043", "types": ["postal_code"]}
            ],
            "geometry": {"location": {"lat": 37.422, "lng": -122.084}}
        }]
    });
    std::fs::write(dir.path().join("response.json"), response.to_string()).unwrap();

    let output = proxima(dir.path(), &["normalize", "response.json", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    assert_eq!(parsed["data"]["street1"], "1600 Amphitheatre Pkwy");
    assert_eq!(parsed["data"]["city"], "Mountain View");
    assert_eq!(parsed["data"]["zip"], "94043");
}

#[test]
fn test_config_reads_local_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("proxima.toml"), "default_range = 25\n").unwrap();

    let output = proxima(dir.path(), &["config", "--json", "--default-units", "km"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let parsed = stdout_json(&output);
    assert_eq!(parsed["data"]["default_range"]["value"], "25");
    assert_eq!(parsed["data"]["default_range"]["source"], "File");
    assert_eq!(parsed["data"]["default_units"]["value"], "km");
    assert_eq!(parsed["data"]["default_units"]["source"], "Cli");
    assert_eq!(parsed["data"]["google_api_key"]["value"], "unset");
}

#[test]
fn test_missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();

    let output = proxima(dir.path(), &["config", "--config", "missing.toml"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Config file not found"));
}

#[test]
fn test_invalid_default_range_is_rejected() {
    let dir = TempDir::new().unwrap();

    let output = proxima(dir.path(), &["--default-range", "0", "config"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("default_range"));
}
