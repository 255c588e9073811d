use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Equality filter on address subfields
///
/// Each entry maps a subfield name to one accepted value or a list of
/// accepted values. Values are OR-combined within a subfield and
/// AND-combined across subfields. Entries are visited in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubfieldFilter(BTreeMap<String, Value>);

impl SubfieldFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subfield constraint
    pub fn with(mut self, subfield: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(subfield, value);
        self
    }

    pub fn insert(&mut self, subfield: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(subfield.into(), value.into());
    }

    pub fn get(&self, subfield: &str) -> Option<&Value> {
        self.0.get(subfield)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for SubfieldFilter {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// How the caller wants results narrowed by subfield
#[derive(Debug, Clone, PartialEq)]
pub enum SubfieldOption {
    /// Explicit subfield filter
    Filter(SubfieldFilter),

    /// Derive a filter from the geocoding result when it is too coarse
    Fallback,
}

impl SubfieldOption {
    pub const FALLBACK_KEYWORD: &'static str = "fallback";

    pub fn is_fallback(&self) -> bool {
        matches!(self, SubfieldOption::Fallback)
    }

    /// The explicit filter, if any
    pub fn filter(&self) -> Option<&SubfieldFilter> {
        match self {
            SubfieldOption::Filter(filter) => Some(filter),
            SubfieldOption::Fallback => None,
        }
    }

    /// Interpret a loosely typed `subfields` option.
    ///
    /// Only the literal string `"fallback"` enables fallback mode. Any other
    /// non-object value means no subfield filtering.
    pub fn from_value(value: &Value) -> Option<SubfieldOption> {
        match value {
            Value::String(s) if s == Self::FALLBACK_KEYWORD => Some(SubfieldOption::Fallback),
            Value::Object(map) if !map.is_empty() => {
                let filter = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                Some(SubfieldOption::Filter(SubfieldFilter(filter)))
            }
            Value::Null | Value::Object(_) => None,
            other => {
                tracing::debug!("Ignoring subfields option that is not a filter: {}", other);
                None
            }
        }
    }
}

impl From<SubfieldFilter> for SubfieldOption {
    fn from(filter: SubfieldFilter) -> Self {
        SubfieldOption::Filter(filter)
    }
}
