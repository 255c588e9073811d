//! Geocoder answering from a fixed table of results.

use async_trait::async_trait;
use proxima_core::models::Target;
use proxima_core::ports::GeocodeLookup;
use proxima_core::{ProximaError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Geocoder backed by an in-memory table of raw results
///
/// Addresses are matched case-insensitively after trimming. Every call to
/// [`GeocodeLookup::lookup`] is counted, whether it matches or not.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    results: BTreeMap<String, Value>,
    lookups: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the raw result returned for an address
    pub fn with_result(mut self, address: &str, raw: Value) -> Self {
        self.insert(address, raw);
        self
    }

    pub fn insert(&mut self, address: &str, raw: Value) {
        self.results.insert(fixture_key(address), raw);
    }

    /// Load fixtures from a JSON object mapping address text to a raw result
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(&value).ok_or_else(|| {
            ProximaError::Serialization(format!(
                "Geocode fixtures in {} must be a JSON object keyed by address",
                path.display()
            ))
        })
    }

    /// Build from a JSON object mapping address text to a raw result
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let mut geocoder = Self::new();
        for (address, raw) in map {
            geocoder.insert(address, raw.clone());
        }
        Some(geocoder)
    }

    /// Number of lookups performed so far
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

fn fixture_key(address: &str) -> String {
    address.trim().to_lowercase()
}

#[async_trait]
impl GeocodeLookup for StaticGeocoder {
    async fn lookup(&self, target: &Target) -> Result<Option<Value>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let text = target.literal_text();
        if text.trim().is_empty() {
            return Ok(None);
        }

        let result = self.results.get(&fixture_key(text)).cloned();
        if result.is_none() {
            tracing::debug!("No geocode fixture for '{}'", text);
        }
        Ok(result)
    }
}
