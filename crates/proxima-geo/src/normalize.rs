//! Turns raw geocoding results into [`AddressRecord`]s.
//!
//! A raw result carries `address_components`, each with a `long_name`, a
//! `short_name` and a list of `types`, plus `geometry.location`. The
//! normalizer keys each component by its first type, then assembles the
//! record using the country's street format and locality conventions.

use proxima_core::models::{AddressRecord, StreetFormat};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::formats::{default_locality_overrides, LocalityOverride, StreetFormatTable};

/// Component types that keep their long name; all others keep the short name
const LONG_NAME_TYPES: [&str; 2] = ["locality", "country"];

/// Components of one result keyed by their primary type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentMap(BTreeMap<String, Option<String>>);

impl ComponentMap {
    /// Build from a raw result; anything that is not a well formed
    /// component is skipped.
    pub fn from_raw(raw: &Value) -> Self {
        let mut map = BTreeMap::new();
        let components = raw
            .get("address_components")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for component in components {
            let Some(kind) = component
                .get("types")
                .and_then(Value::as_array)
                .and_then(|types| types.first())
                .and_then(Value::as_str)
            else {
                continue;
            };

            let name_key = if LONG_NAME_TYPES.contains(&kind) {
                "long_name"
            } else {
                "short_name"
            };
            let name = component
                .get(name_key)
                .and_then(Value::as_str)
                .map(str::to_string);

            // Later components with the same primary type win
            map.insert(kind.to_string(), name);
        }

        Self(map)
    }

    pub fn get(&self, kind: &str) -> Option<&str> {
        self.0.get(kind).and_then(|name| name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalizes raw geocoding results using country convention tables
#[derive(Debug, Clone)]
pub struct AddressNormalizer {
    street_formats: StreetFormatTable,
    locality_overrides: BTreeMap<String, LocalityOverride>,
}

impl Default for AddressNormalizer {
    fn default() -> Self {
        Self {
            street_formats: StreetFormatTable::default(),
            locality_overrides: default_locality_overrides(),
        }
    }
}

impl AddressNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace street formats for specific countries
    pub fn with_street_formats(mut self, formats: &BTreeMap<String, StreetFormat>) -> Self {
        self.street_formats.extend(formats);
        self
    }

    pub fn street_formats(&self) -> &StreetFormatTable {
        &self.street_formats
    }

    /// Normalize one raw result. Never fails: missing or malformed parts
    /// simply leave the corresponding fields empty.
    pub fn normalize(&self, raw: &Value) -> AddressRecord {
        let components = ComponentMap::from_raw(raw);
        let country = components.get("country").map(str::to_string);

        let (city, state) = match country.as_deref().and_then(|c| self.locality_overrides.get(c)) {
            Some(locality) => (components.get(locality.city), components.get(locality.state)),
            None => (
                components.get("locality"),
                components.get("administrative_area_level_1"),
            ),
        };

        let street1 = self
            .street_formats
            .format_for(country.as_deref())
            .assemble(components.get("street_number"), components.get("route"));

        let location = raw.get("geometry").and_then(|g| g.get("location"));
        if location.is_none() {
            tracing::debug!("Geocoding result has no geometry, coordinates left empty");
        }
        let coordinate = |key: &str| location.and_then(|l| l.get(key)).and_then(Value::as_f64);

        AddressRecord {
            street1,
            street2: None,
            city: city.map(str::to_string),
            state: state.map(str::to_string),
            zip: components.get("postal_code").map(str::to_string),
            county: None,
            country,
            lat: coordinate("lat"),
            lng: coordinate("lng"),
            raw: raw.clone(),
        }
    }
}

/// Normalize with the default country tables
pub fn normalize(raw: &Value) -> AddressRecord {
    AddressNormalizer::default().normalize(raw)
}
