use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::subfield::{SubfieldFilter, SubfieldOption};
use super::target::Target;

/// Search radius used when none (or an invalid one) is given
pub const DEFAULT_RANGE: f64 = 500.0;

/// Distance units for a proximity search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Miles,
    Kilometers,
}

impl Units {
    /// Accepted unit names
    pub const VALID: [&'static str; 4] = ["mi", "km", "miles", "kilometers"];

    /// Parse a unit name, falling back to miles for anything unrecognized.
    ///
    /// Matching is exact: only `mi`, `km`, `miles` and `kilometers` are accepted.
    pub fn parse(units: &str) -> Self {
        match units {
            "km" | "kilometers" => Units::Kilometers,
            "mi" | "miles" => Units::Miles,
            other => {
                tracing::debug!("Unknown units '{}', using miles", other);
                Units::default()
            }
        }
    }

    /// Short name (`mi` or `km`)
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Units::Miles => "mi",
            Units::Kilometers => "km",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Read a number from a JSON number or a numeric string
pub(crate) fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Caller-facing options of a proximity search
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct ProximityOptions {
    /// Search anchor; without one no distance filtering happens
    pub target: Option<Target>,

    /// Maximum distance, see [`ProximityOptions::effective_range`]
    pub range: Option<f64>,

    pub units: Units,

    pub subfields: Option<SubfieldOption>,

    /// Exclude records with missing coordinates
    pub require_coords: Option<bool>,

    /// Handle of a numeric field holding a per-record search radius
    pub reverse_radius: Option<String>,
}

impl ProximityOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn range(mut self, range: f64) -> Self {
        self.range = Some(range);
        self
    }

    pub fn units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    pub fn subfields(mut self, filter: SubfieldFilter) -> Self {
        self.subfields = Some(SubfieldOption::Filter(filter));
        self
    }

    pub fn fallback(mut self) -> Self {
        self.subfields = Some(SubfieldOption::Fallback);
        self
    }

    pub fn require_coords(mut self, required: bool) -> Self {
        self.require_coords = Some(required);
        self
    }

    pub fn reverse_radius(mut self, handle: impl Into<String>) -> Self {
        self.reverse_radius = Some(handle.into());
        self
    }

    /// The range to filter by: the given range if finite and positive,
    /// otherwise `default`.
    pub fn effective_range(&self, default: f64) -> f64 {
        match self.range {
            Some(range) if range.is_finite() && range > 0.0 => range,
            _ => default,
        }
    }

    /// Parse options from a loosely typed JSON object.
    ///
    /// Never fails: malformed entries fall back to their defaults.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            tracing::debug!("Proximity options are not an object, using defaults");
            return Self::default();
        };

        let units = match map.get("units") {
            Some(Value::String(units)) => Units::parse(units),
            _ => Units::default(),
        };

        let require_coords = map.get("requireCoords").and_then(|v| match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0),
            Value::String(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" | "" => Some(false),
                _ => None,
            },
            _ => None,
        });

        let reverse_radius = map
            .get("reverseRadius")
            .and_then(Value::as_str)
            .filter(|handle| !handle.trim().is_empty())
            .map(str::to_string);

        Self {
            target: map.get("target").and_then(Target::from_value),
            range: map.get("range").and_then(numeric),
            units,
            subfields: map.get("subfields").and_then(SubfieldOption::from_value),
            require_coords,
            reverse_radius,
        }
    }
}

impl From<Value> for ProximityOptions {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}
