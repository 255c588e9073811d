use serde::{Deserialize, Serialize};

use super::coords::Coordinates;

/// Canonical address produced from a raw geocoding result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Street line; `None` or non-empty after trimming
    pub street1: Option<String>,

    /// Always `None` when built by the normalizer, reserved for callers
    pub street2: Option<String>,

    pub city: Option<String>,

    pub state: Option<String>,

    pub zip: Option<String>,

    /// Always `None` when built by the normalizer, reserved for callers
    pub county: Option<String>,

    pub country: Option<String>,

    pub lat: Option<f64>,

    pub lng: Option<f64>,

    /// Original provider payload
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// How a country writes the street line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetFormat {
    /// `"{name} {number}"`
    #[default]
    NameFirst,

    /// `"{number} {name}"`
    NumberFirst,

    /// `"{name}, {number}"`
    NameCommaNumber,
}

impl StreetFormat {
    /// Assemble a trimmed street line from its optional parts.
    ///
    /// Returns `None` when neither part carries any text.
    pub fn assemble(&self, number: Option<&str>, name: Option<&str>) -> Option<String> {
        let number = number.map(str::trim).unwrap_or("");
        let name = name.map(str::trim).unwrap_or("");
        if number.is_empty() && name.is_empty() {
            return None;
        }

        let line = match self {
            StreetFormat::NameFirst => format!("{} {}", name, number),
            StreetFormat::NumberFirst => format!("{} {}", number, name),
            StreetFormat::NameCommaNumber => format!("{}, {}", name, number),
        };
        Some(line.trim().to_string())
    }
}

impl AddressRecord {
    /// Coordinates of the address, if both components are known
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.lat, self.lng)
    }

    /// Whether the record carries a concrete street line
    pub fn has_street(&self) -> bool {
        self.street1.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Value of a named text subfield
    pub fn subfield(&self, name: &str) -> Option<&str> {
        match name {
            "street1" => self.street1.as_deref(),
            "street2" => self.street2.as_deref(),
            "city" => self.city.as_deref(),
            "state" => self.state.as_deref(),
            "zip" => self.zip.as_deref(),
            "county" => self.county.as_deref(),
            "country" => self.country.as_deref(),
            _ => None,
        }
    }
}
