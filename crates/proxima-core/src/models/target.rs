use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::coords::Coordinates;
use super::options::numeric;

/// Partial address description used as a search target
///
/// Keys are address sub-components understood by the geocoder, most
/// importantly `address`. A query holding parseable `lat` and `lng` entries is
/// treated as literal coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressQuery(BTreeMap<String, String>);

impl AddressQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component to the query
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Free-text address component, if present and not blank
    pub fn address(&self) -> Option<&str> {
        self.get("address").filter(|a| !a.trim().is_empty())
    }

    /// Literal coordinates carried by the query
    pub fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.get("lat").and_then(|v| v.trim().parse::<f64>().ok());
        let lng = self.get("lng").and_then(|v| v.trim().parse::<f64>().ok());
        Coordinates::from_parts(lat, lng)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The anchor of a proximity search
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Explicit centre point, used verbatim
    Coordinates(Coordinates),

    /// Free-form address text, geocoded
    Address(String),

    /// Partial address description, geocoded
    Query(AddressQuery),

    /// A target value whose shape could not be interpreted.
    /// Resolves to the default centre point without a lookup.
    Unrecognized,
}

impl Target {
    pub fn address(text: impl Into<String>) -> Self {
        Target::Address(text.into())
    }

    pub fn coordinates(lat: f64, lng: f64) -> Self {
        Target::Coordinates(Coordinates::new(lat, lng))
    }

    /// Coordinates that can be used without a geocoding lookup
    pub fn literal_coordinates(&self) -> Option<Coordinates> {
        match self {
            Target::Coordinates(coords) => Some(*coords),
            Target::Query(query) => query.coordinates(),
            Target::Address(_) | Target::Unrecognized => None,
        }
    }

    /// The address text the caller typed, or an empty string
    pub fn literal_text(&self) -> &str {
        match self {
            Target::Address(text) => text,
            Target::Query(query) => query.get("address").unwrap_or(""),
            Target::Coordinates(_) | Target::Unrecognized => "",
        }
    }

    /// Interpret a loosely typed target value.
    ///
    /// Returns `None` when no target was given (null, false, zero, or an
    /// empty string, list, or object).
    pub fn from_value(value: &Value) -> Option<Target> {
        match value {
            Value::Null | Value::Bool(false) => None,
            Value::String(text) if text.trim().is_empty() => None,
            Value::String(text) => Some(Target::Address(text.clone())),
            Value::Object(map) if map.is_empty() => None,
            Value::Object(map) => {
                let lat = map.get("lat").and_then(numeric);
                let lng = map.get("lng").and_then(numeric);
                if let Some(coords) = Coordinates::from_parts(lat, lng) {
                    return Some(Target::Coordinates(coords));
                }

                let components = map
                    .iter()
                    .filter_map(|(key, value)| match value {
                        Value::String(s) => Some((key.clone(), s.clone())),
                        Value::Number(n) => Some((key.clone(), n.to_string())),
                        _ => None,
                    })
                    .collect();
                Some(Target::Query(AddressQuery(components)))
            }
            Value::Array(items) if items.is_empty() => None,
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Array(_) | Value::Number(_) | Value::Bool(true) => {
                tracing::debug!("Unrecognized proximity search target: {}", value);
                Some(Target::Unrecognized)
            }
        }
    }
}

impl From<Coordinates> for Target {
    fn from(coords: Coordinates) -> Self {
        Target::Coordinates(coords)
    }
}

impl From<AddressQuery> for Target {
    fn from(query: AddressQuery) -> Self {
        Target::Query(query)
    }
}
