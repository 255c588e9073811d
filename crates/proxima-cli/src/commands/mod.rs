//! Command implementations

mod config;
mod normalize;
mod search;
mod sql;

use crate::cli::{Cli, Commands, ProximityArgs};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::{bail, Context, Result};
use proxima_core::config::LayeredConfig;
use proxima_core::models::{AddressField, ProximityOptions};
use proxima_core::ports::GeocodeLookup;
use proxima_geocode::{GoogleGeocoder, StaticGeocoder};
use proxima_search::{Resolution, ResolutionSource, SearchSettings};
use serde_json::{Map, Value};

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(cli.config.as_deref(), cli.overrides()?)?;

    match cli.command {
        Commands::Search(args) => search::execute(args, &config, &output).await,
        Commands::Sql(args) => sql::execute(args, &config, &output).await,
        Commands::Normalize(args) => normalize::execute(args, &config, &output),
        Commands::Config => config::execute(&config, &output),
    }
}

/// Merge `--options` JSON with the individual flags, flags winning.
///
/// The settings' default units apply when neither names any units.
pub(crate) fn proximity_options(
    args: &ProximityArgs,
    settings: &SearchSettings,
) -> Result<ProximityOptions> {
    let mut options = match args.options.as_deref() {
        Some(raw) => parse_options_json(raw)?,
        None => Map::new(),
    };

    if let Some(ref target) = args.target {
        options.insert("target".to_string(), Value::String(target.clone()));
    }
    if let Some(ref near) = args.near {
        let (lat, lng) = parse_lat_lng(near)?;
        options.insert("target".to_string(), serde_json::json!({ "lat": lat, "lng": lng }));
    }
    if let Some(range) = args.range {
        options.insert("range".to_string(), serde_json::json!(range));
    }
    if let Some(ref units) = args.units {
        options.insert("units".to_string(), Value::String(units.clone()));
    }
    if args.fallback {
        options.insert("subfields".to_string(), Value::String("fallback".to_string()));
    }
    if !args.subfields.is_empty() {
        options.insert("subfields".to_string(), Value::Object(parse_subfields(&args.subfields)?));
    }
    if args.require_coords {
        options.insert("requireCoords".to_string(), Value::Bool(true));
    }
    if let Some(ref handle) = args.reverse_radius {
        options.insert("reverseRadius".to_string(), Value::String(handle.clone()));
    }

    Ok(settings.parse_options(&Value::Object(options)))
}

fn parse_options_json(raw: &str) -> Result<Map<String, Value>> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path))?,
        None => raw.to_string(),
    };

    match serde_json::from_str::<Value>(&text).context("Options are not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("Options must be a JSON object, got {}", other),
    }
}

fn parse_lat_lng(raw: &str) -> Result<(f64, f64)> {
    let (lat, lng) = raw
        .split_once(',')
        .with_context(|| format!("Expected LAT,LNG, got '{}'", raw))?;
    let lat = lat.trim().parse::<f64>().with_context(|| format!("Invalid latitude '{}'", lat))?;
    let lng = lng.trim().parse::<f64>().with_context(|| format!("Invalid longitude '{}'", lng))?;
    Ok((lat, lng))
}

/// `NAME=VALUE` pairs; a repeated name collects its values into a list
fn parse_subfields(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut subfields = Map::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .with_context(|| format!("Expected NAME=VALUE, got '{}'", pair))?;
        let value = Value::String(value.trim().to_string());

        match subfields.get_mut(name.trim()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => *existing = Value::Array(vec![existing.take(), value]),
            None => {
                subfields.insert(name.trim().to_string(), value);
            }
        }
    }
    Ok(subfields)
}

/// The address field the search runs against
pub(crate) fn address_field(args: &ProximityArgs) -> AddressField {
    AddressField::new(args.field_id, args.field_handle.clone())
}

/// Pick the geocoder for address targets
pub(crate) fn geocoder(
    args: &ProximityArgs,
    options: &ProximityOptions,
    config: &LayeredConfig,
    output: &OutputWriter,
) -> Result<Box<dyn GeocodeLookup>> {
    if args.google {
        let geocoder = GoogleGeocoder::from_config(config)?;
        tracing::info!("Geocoding with {}", geocoder.base_url());
        return Ok(Box::new(geocoder));
    }

    if let Some(ref path) = args.geocode_fixtures {
        let geocoder = StaticGeocoder::from_file(path)
            .with_context(|| format!("Failed to load geocode fixtures from {}", path.display()))?;
        tracing::info!("Loaded {} geocode fixture(s)", geocoder.len());
        return Ok(Box::new(geocoder));
    }

    let needs_lookup = options.target.as_ref().is_some_and(|target| {
        target.literal_coordinates().is_none() && !target.literal_text().is_empty()
    });
    if needs_lookup {
        output.warning(
            "No geocoder selected; address targets resolve to the default point. \
             Use --geocode-fixtures or --google.",
        );
    }
    Ok(Box::new(StaticGeocoder::new()))
}

/// One-line description of where the search centre came from
pub(crate) fn describe_resolution(resolution: Option<&Resolution>) -> String {
    match resolution {
        None => "none (no target)".to_string(),
        Some(resolution) => {
            let source = match &resolution.source {
                ResolutionSource::Literal => "literal coordinates".to_string(),
                ResolutionSource::Geocoded => "geocoded".to_string(),
                ResolutionSource::Default(reason) => format!("default point ({})", reason),
            };
            format!(
                "{}, {} ({})",
                resolution.coordinates.lat, resolution.coordinates.lng, source
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_core::models::{SubfieldOption, Target, Units};

    fn settings(default_units: Units) -> SearchSettings {
        SearchSettings {
            default_units,
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_override_options_json() {
        let args = ProximityArgs {
            options: Some(r#"{"target": "Dallas", "range": 10, "units": "km"}"#.to_string()),
            target: Some("Austin".to_string()),
            range: Some(25.0),
            ..Default::default()
        };

        let options = proximity_options(&args, &settings(Units::Miles)).unwrap();
        assert_eq!(options.target, Some(Target::address("Austin")));
        assert_eq!(options.range, Some(25.0));
        assert_eq!(options.units, Units::Kilometers);
    }

    #[test]
    fn test_near_builds_literal_target() {
        let args = ProximityArgs {
            near: Some("30.25, -97.75".to_string()),
            ..Default::default()
        };
        let options = proximity_options(&args, &settings(Units::Miles)).unwrap();
        assert_eq!(options.target, Some(Target::coordinates(30.25, -97.75)));

        let bad = ProximityArgs {
            near: Some("30.25".to_string()),
            ..Default::default()
        };
        assert!(proximity_options(&bad, &settings(Units::Miles)).is_err());
    }

    #[test]
    fn test_subfield_flags() {
        let args = ProximityArgs {
            subfields: vec!["zip=78701".to_string(), "zip=78702".to_string(), "state=TX".to_string()],
            ..Default::default()
        };
        let options = proximity_options(&args, &settings(Units::Miles)).unwrap();
        let filter = options.subfields.as_ref().and_then(SubfieldOption::filter).unwrap();
        assert_eq!(filter.get("zip"), Some(&serde_json::json!(["78701", "78702"])));
        assert_eq!(filter.get("state"), Some(&serde_json::json!("TX")));
    }

    #[test]
    fn test_default_units_fill_in() {
        let args = ProximityArgs::default();
        let options = proximity_options(&args, &settings(Units::Kilometers)).unwrap();
        assert_eq!(options.units, Units::Kilometers);

        let args = ProximityArgs {
            units: Some("mi".to_string()),
            ..Default::default()
        };
        let options = proximity_options(&args, &settings(Units::Kilometers)).unwrap();
        assert_eq!(options.units, Units::Miles);
    }

    #[test]
    fn test_fallback_flag() {
        let args = ProximityArgs {
            fallback: true,
            ..Default::default()
        };
        let options = proximity_options(&args, &settings(Units::Miles)).unwrap();
        assert_eq!(options.subfields, Some(SubfieldOption::Fallback));
    }

    #[test]
    fn test_options_must_be_an_object() {
        let args = ProximityArgs {
            options: Some("[1, 2]".to_string()),
            ..Default::default()
        };
        assert!(proximity_options(&args, &settings(Units::Miles)).is_err());
    }
}
