use proxima_core::config::{LayeredConfig, DEFAULT_FOCUSED_TYPES, DEFAULT_SUBFIELDS};
use proxima_core::models::{
    Coordinates, ProximityOptions, Units, DEFAULT_COORDINATES, DEFAULT_RANGE,
};
use proxima_geo::AddressNormalizer;
use serde_json::Value;
use std::collections::BTreeSet;

/// Coordinate subfields that may always be filtered on
const COORDINATE_SUBFIELDS: [&str; 2] = ["lat", "lng"];

/// Settings shared by every search a builder performs
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Centre used when a target cannot be resolved
    pub default_coordinates: Coordinates,

    /// Range used when none or an invalid one is given
    pub default_range: f64,

    /// Units applied by `parse_options` when the payload names none
    pub default_units: Units,

    /// Subfields a filter may reference
    pub subfield_whitelist: BTreeSet<String>,

    /// Result types precise enough to skip the subfield fallback
    pub focused_types: BTreeSet<String>,

    pub normalizer: AddressNormalizer,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_coordinates: DEFAULT_COORDINATES,
            default_range: DEFAULT_RANGE,
            default_units: Units::default(),
            subfield_whitelist: whitelist(DEFAULT_SUBFIELDS.iter().copied()),
            focused_types: DEFAULT_FOCUSED_TYPES.iter().map(|t| t.to_string()).collect(),
            normalizer: AddressNormalizer::default(),
        }
    }
}

impl SearchSettings {
    /// Derive settings from layered configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            default_coordinates: config.default_coordinates(),
            default_range: config.default_range.value,
            default_units: config.default_units.value,
            subfield_whitelist: whitelist(config.subfields.value.iter().map(String::as_str)),
            focused_types: config.focused_types.value.iter().cloned().collect(),
            normalizer: AddressNormalizer::default()
                .with_street_formats(&config.street_formats.value),
        }
    }

    /// Parse loose caller options, filling in `default_units` when the
    /// payload has no `units` key
    pub fn parse_options(&self, value: &Value) -> ProximityOptions {
        let options = ProximityOptions::from_value(value);
        match value.get("units") {
            Some(_) => options,
            None => options.units(self.default_units),
        }
    }

    /// Whether a filter may reference this subfield
    pub fn allows_subfield(&self, subfield: &str) -> bool {
        self.subfield_whitelist.contains(subfield)
    }

    /// Whether a geocoding result type is precise enough to skip the fallback
    pub fn is_focused_type(&self, result_type: &str) -> bool {
        self.focused_types.contains(result_type)
    }
}

fn whitelist<'a>(handles: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    handles
        .chain(COORDINATE_SUBFIELDS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxima_core::config::ConfigSource;

    #[test]
    fn test_default_whitelist_includes_coordinates() {
        let settings = SearchSettings::default();
        for subfield in ["street1", "city", "county", "country", "lat", "lng"] {
            assert!(settings.allows_subfield(subfield), "{} should be allowed", subfield);
        }
        assert!(!settings.allows_subfield("elementId"));
        assert!(!settings.allows_subfield("raw"));
    }

    #[test]
    fn test_parse_options_applies_default_units() {
        let settings = SearchSettings {
            default_units: Units::Kilometers,
            ..Default::default()
        };

        let options = settings.parse_options(&serde_json::json!({"target": "Austin"}));
        assert_eq!(options.units, Units::Kilometers);

        let options = settings.parse_options(&serde_json::json!({"units": "mi"}));
        assert_eq!(options.units, Units::Miles);

        // An explicit but unknown value keeps the loose parser's fallback
        let options = settings.parse_options(&serde_json::json!({"units": "leagues"}));
        assert_eq!(options.units, Units::Miles);

        let options = SearchSettings::default().parse_options(&serde_json::json!({}));
        assert_eq!(options.units, Units::Miles);
    }

    #[test]
    fn test_from_config() {
        let mut config = LayeredConfig::with_defaults();
        config.default_range.update(25.0, ConfigSource::Cli);
        config.default_units.update(Units::Kilometers, ConfigSource::Cli);
        config
            .subfields
            .update(vec!["city".to_string()], ConfigSource::File);
        config
            .focused_types
            .update(vec!["postal_code".to_string()], ConfigSource::File);

        let settings = SearchSettings::from_config(&config);
        assert_eq!(settings.default_range, 25.0);
        assert_eq!(settings.default_units, Units::Kilometers);
        assert!(settings.allows_subfield("city"));
        assert!(settings.allows_subfield("lat"));
        assert!(!settings.allows_subfield("state"));
        assert!(settings.is_focused_type("postal_code"));
        assert!(!settings.is_focused_type("locality"));
        assert_eq!(settings.default_coordinates, DEFAULT_COORDINATES);
    }
}
