use crate::error::{ProximaError, Result};
use crate::models::{Coordinates, StreetFormat, Units, DEFAULT_COORDINATES, DEFAULT_RANGE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// Address subfields a stored address row exposes for filtering
pub const DEFAULT_SUBFIELDS: [&str; 8] =
    ["street1", "street2", "city", "state", "zip", "neighborhood", "county", "country"];

/// Geocoding result types precise enough to skip the subfield fallback
pub const DEFAULT_FOCUSED_TYPES: [&str; 5] =
    ["premise", "route", "intersection", "locality", "neighborhood"];

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for Proxima
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub default_lat: ConfigValue<f64>,
    pub default_lng: ConfigValue<f64>,
    pub default_range: ConfigValue<f64>,
    pub default_units: ConfigValue<Units>,
    pub subfields: ConfigValue<Vec<String>>,
    pub focused_types: ConfigValue<Vec<String>>,
    pub street_formats: ConfigValue<BTreeMap<String, StreetFormat>>,
    pub google_api_key: ConfigValue<Option<String>>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            default_lat: ConfigValue::new(DEFAULT_COORDINATES.lat, ConfigSource::Default),
            default_lng: ConfigValue::new(DEFAULT_COORDINATES.lng, ConfigSource::Default),
            default_range: ConfigValue::new(DEFAULT_RANGE, ConfigSource::Default),
            default_units: ConfigValue::new(Units::Miles, ConfigSource::Default),
            subfields: ConfigValue::new(to_strings(&DEFAULT_SUBFIELDS), ConfigSource::Default),
            focused_types: ConfigValue::new(
                to_strings(&DEFAULT_FOCUSED_TYPES),
                ConfigSource::Default,
            ),
            street_formats: ConfigValue::new(BTreeMap::new(), ConfigSource::Default),
            google_api_key: ConfigValue::new(None, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProximaError::ConfigFileNotFound { path: path.to_path_buf() });
        }

        let content = fs::read_to_string(path).map_err(|e| ProximaError::ConfigInvalid {
            key: "file".to_string(),
            reason: format!("Failed to read config file: {}", e),
        })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ProximaError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(lat) = file_config.default_lat {
            self.default_lat.update(validate_lat(lat)?, ConfigSource::File);
        }

        if let Some(lng) = file_config.default_lng {
            self.default_lng.update(validate_lng(lng)?, ConfigSource::File);
        }

        if let Some(range) = file_config.default_range {
            self.default_range.update(validate_range(range)?, ConfigSource::File);
        }

        if let Some(units) = file_config.default_units {
            self.default_units.update(parse_units(&units)?, ConfigSource::File);
        }

        if let Some(subfields) = file_config.subfields {
            self.subfields.update(subfields, ConfigSource::File);
        }

        if let Some(focused_types) = file_config.focused_types {
            self.focused_types.update(focused_types, ConfigSource::File);
        }

        if let Some(street_formats) = file_config.street_formats {
            self.street_formats.update(street_formats, ConfigSource::File);
        }

        if let Some(key) = file_config.google_api_key {
            self.google_api_key.update(Some(key), ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // PROXIMA_DEFAULT_LAT / PROXIMA_DEFAULT_LNG
        if let Ok(lat_str) = env::var("PROXIMA_DEFAULT_LAT") {
            match lat_str.trim().parse::<f64>().map_err(|e| e.to_string()).and_then(|lat| {
                validate_lat(lat).map_err(|e| e.to_string())
            }) {
                Ok(lat) => self.default_lat.update(lat, ConfigSource::Environment),
                Err(reason) => {
                    tracing::warn!("Invalid PROXIMA_DEFAULT_LAT value '{}': {}", lat_str, reason)
                }
            }
        }

        if let Ok(lng_str) = env::var("PROXIMA_DEFAULT_LNG") {
            match lng_str.trim().parse::<f64>().map_err(|e| e.to_string()).and_then(|lng| {
                validate_lng(lng).map_err(|e| e.to_string())
            }) {
                Ok(lng) => self.default_lng.update(lng, ConfigSource::Environment),
                Err(reason) => {
                    tracing::warn!("Invalid PROXIMA_DEFAULT_LNG value '{}': {}", lng_str, reason)
                }
            }
        }

        // PROXIMA_DEFAULT_RANGE
        if let Ok(range_str) = env::var("PROXIMA_DEFAULT_RANGE") {
            match range_str.trim().parse::<f64>().ok().and_then(|r| validate_range(r).ok()) {
                Some(range) => self.default_range.update(range, ConfigSource::Environment),
                None => tracing::warn!(
                    "Invalid PROXIMA_DEFAULT_RANGE value '{}': expected a positive number",
                    range_str
                ),
            }
        }

        // PROXIMA_DEFAULT_UNITS
        if let Ok(units_str) = env::var("PROXIMA_DEFAULT_UNITS") {
            match parse_units(&units_str) {
                Ok(units) => self.default_units.update(units, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PROXIMA_DEFAULT_UNITS value '{}': expected mi, km, miles, or kilometers",
                    units_str
                ),
            }
        }

        // PROXIMA_SUBFIELDS / PROXIMA_FOCUSED_TYPES (comma-separated)
        if let Ok(list) = env::var("PROXIMA_SUBFIELDS") {
            self.subfields.update(split_list(&list), ConfigSource::Environment);
        }

        if let Ok(list) = env::var("PROXIMA_FOCUSED_TYPES") {
            self.focused_types.update(split_list(&list), ConfigSource::Environment);
        }

        // PROXIMA_GOOGLE_API_KEY
        if let Ok(key) = env::var("PROXIMA_GOOGLE_API_KEY") {
            if !key.trim().is_empty() {
                self.google_api_key.update(Some(key), ConfigSource::Environment);
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    ///
    /// Values are checked like the file layer's; nothing is applied on error.
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) -> Result<()> {
        let lat = overrides.default_lat.map(validate_lat).transpose()?;
        let lng = overrides.default_lng.map(validate_lng).transpose()?;
        let range = overrides.default_range.map(validate_range).transpose()?;

        if let Some(lat) = lat {
            self.default_lat.update(lat, ConfigSource::Cli);
        }

        if let Some(lng) = lng {
            self.default_lng.update(lng, ConfigSource::Cli);
        }

        if let Some(range) = range {
            self.default_range.update(range, ConfigSource::Cli);
        }

        if let Some(units) = overrides.default_units {
            self.default_units.update(units, ConfigSource::Cli);
        }

        if let Some(key) = overrides.google_api_key {
            self.google_api_key.update(Some(key), ConfigSource::Cli);
        }

        Ok(())
    }

    /// Centre point used when a target cannot be resolved
    pub fn default_coordinates(&self) -> Coordinates {
        Coordinates::new(self.default_lat.value, self.default_lng.value)
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "default_lat".to_string(),
            (self.default_lat.value.to_string(), self.default_lat.source),
        );
        map.insert(
            "default_lng".to_string(),
            (self.default_lng.value.to_string(), self.default_lng.source),
        );
        map.insert(
            "default_range".to_string(),
            (self.default_range.value.to_string(), self.default_range.source),
        );
        map.insert(
            "default_units".to_string(),
            (self.default_units.value.to_string(), self.default_units.source),
        );
        map.insert(
            "subfields".to_string(),
            (self.subfields.value.join(", "), self.subfields.source),
        );
        map.insert(
            "focused_types".to_string(),
            (self.focused_types.value.join(", "), self.focused_types.source),
        );
        map.insert(
            "street_formats".to_string(),
            (
                format!("{} override(s)", self.street_formats.value.len()),
                self.street_formats.source,
            ),
        );

        // Never echo the key itself
        let key_state = match self.google_api_key.value {
            Some(_) => "set",
            None => "unset",
        };
        map.insert(
            "google_api_key".to_string(),
            (key_state.to_string(), self.google_api_key.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    default_lat: Option<f64>,
    default_lng: Option<f64>,
    default_range: Option<f64>,
    default_units: Option<String>,
    subfields: Option<Vec<String>>,
    focused_types: Option<Vec<String>>,
    street_formats: Option<BTreeMap<String, StreetFormat>>,
    google_api_key: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub default_lat: Option<f64>,
    pub default_lng: Option<f64>,
    pub default_range: Option<f64>,
    pub default_units: Option<Units>,
    pub google_api_key: Option<String>,
}

/// Parse units strictly, for configuration where a typo should be reported
pub fn parse_units(s: &str) -> Result<Units> {
    match s.trim().to_lowercase().as_str() {
        "mi" | "miles" => Ok(Units::Miles),
        "km" | "kilometers" => Ok(Units::Kilometers),
        _ => Err(ProximaError::ConfigInvalid {
            key: "default_units".to_string(),
            reason: format!("Invalid units: {}. Use mi, km, miles, or kilometers", s),
        }),
    }
}

fn validate_lat(lat: f64) -> Result<f64> {
    if lat.is_finite() && (-90.0..=90.0).contains(&lat) {
        Ok(lat)
    } else {
        Err(ProximaError::ConfigInvalid {
            key: "default_lat".to_string(),
            reason: format!("{} is outside [-90, 90]", lat),
        })
    }
}

fn validate_lng(lng: f64) -> Result<f64> {
    if lng.is_finite() && (-180.0..=180.0).contains(&lng) {
        Ok(lng)
    } else {
        Err(ProximaError::ConfigInvalid {
            key: "default_lng".to_string(),
            reason: format!("{} is outside [-180, 180]", lng),
        })
    }
}

fn validate_range(range: f64) -> Result<f64> {
    if range.is_finite() && range > 0.0 {
        Ok(range)
    } else {
        Err(ProximaError::ConfigInvalid {
            key: "default_range".to_string(),
            reason: format!("{} is not a positive number", range),
        })
    }
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
