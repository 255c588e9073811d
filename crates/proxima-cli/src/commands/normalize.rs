//! Normalize command implementation

use crate::cli::NormalizeArgs;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use proxima_core::config::LayeredConfig;
use proxima_geocode::google::parse_response;
use proxima_search::SearchSettings;
use serde_json::Value;
use std::fs;

pub fn execute(args: NormalizeArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let content = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let payload: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", args.input.display()))?;

    // A full API response carries `results`; anything else is one result
    let result = if payload.get("results").is_some() {
        match parse_response(&payload)? {
            Some(result) => result,
            None => {
                output.warning("The geocoding response has no results");
                return Ok(());
            }
        }
    } else {
        payload
    };

    let settings = SearchSettings::from_config(config);
    let address = settings.normalizer.normalize(&result);

    if output.is_json() {
        return output.result(&address);
    }

    output.section("Address");
    let fields = [
        ("Street 1", address.street1.as_deref()),
        ("Street 2", address.street2.as_deref()),
        ("City", address.city.as_deref()),
        ("State", address.state.as_deref()),
        ("Zip", address.zip.as_deref()),
        ("County", address.county.as_deref()),
        ("Country", address.country.as_deref()),
    ];
    for (label, value) in fields {
        output.kv(label, value.unwrap_or("-"));
    }
    match address.coordinates() {
        Some(coords) => output.kv("Coordinates", format!("{}, {}", coords.lat, coords.lng)),
        None => output.kv("Coordinates", "-"),
    }

    Ok(())
}
