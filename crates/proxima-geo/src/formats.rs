//! Per-country address conventions used by the normalizer.

use proxima_core::models::StreetFormat;
use std::collections::BTreeMap;

/// Countries that write the house number before the street name
pub const NUMBER_FIRST_COUNTRIES: [&str; 15] = [
    "Australia",
    "Canada",
    "France",
    "Hong Kong",
    "India",
    "Ireland",
    "Malaysia",
    "New Zealand",
    "Pakistan",
    "Singapore",
    "Sri Lanka",
    "Taiwan",
    "Thailand",
    "United Kingdom",
    "United States",
];

/// Countries that put a comma between the street name and the number
pub const COMMA_AFTER_STREET_COUNTRIES: [&str; 1] = ["Italy"];

/// Street line format keyed by country long name
#[derive(Debug, Clone, PartialEq)]
pub struct StreetFormatTable {
    formats: BTreeMap<String, StreetFormat>,
}

impl Default for StreetFormatTable {
    fn default() -> Self {
        let mut formats = BTreeMap::new();
        for country in NUMBER_FIRST_COUNTRIES {
            formats.insert(country.to_string(), StreetFormat::NumberFirst);
        }
        for country in COMMA_AFTER_STREET_COUNTRIES {
            formats.insert(country.to_string(), StreetFormat::NameCommaNumber);
        }
        Self { formats }
    }
}

impl StreetFormatTable {
    /// A table where every country uses the default format
    pub fn empty() -> Self {
        Self {
            formats: BTreeMap::new(),
        }
    }

    /// Format for a country; unknown or missing countries use the default
    pub fn format_for(&self, country: Option<&str>) -> StreetFormat {
        country
            .and_then(|c| self.formats.get(c))
            .copied()
            .unwrap_or_default()
    }

    pub fn insert(&mut self, country: impl Into<String>, format: StreetFormat) {
        self.formats.insert(country.into(), format);
    }

    /// Add or replace entries, e.g. from configuration
    pub fn extend<'a>(&mut self, entries: impl IntoIterator<Item = (&'a String, &'a StreetFormat)>) {
        for (country, format) in entries {
            self.formats.insert(country.clone(), *format);
        }
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Component types that replace the usual city and state sources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalityOverride {
    pub city: &'static str,
    pub state: &'static str,
}

/// Locality overrides keyed by country long name
pub fn default_locality_overrides() -> BTreeMap<String, LocalityOverride> {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        "United Kingdom".to_string(),
        LocalityOverride {
            city: "postal_town",
            state: "administrative_area_level_2",
        },
    );
    overrides
}
