//! Subfield fallback for geographically coarse geocoding results.
//!
//! A search for "Texas" geocodes to the centre of the state, and a radius
//! around that point says little about which records are actually in
//! Texas. When the caller opts in, the normalized candidate's locality
//! subfields become a filter instead. If the search text names one of
//! those subfields exactly, only that subfield is kept.

use proxima_core::models::{AddressRecord, SubfieldFilter};
use serde_json::Value;

use crate::context::SearchContext;
use crate::settings::SearchSettings;

/// Subfields a fallback filter is built from, in matching order
pub const FALLBACK_SUBFIELDS: [&str; 5] = ["city", "state", "zip", "county", "country"];

pub struct SubfieldFallbackResolver<'a> {
    settings: &'a SearchSettings,
}

impl<'a> SubfieldFallbackResolver<'a> {
    pub fn new(settings: &'a SearchSettings) -> Self {
        Self { settings }
    }

    /// Replace the context's fallback option with a derived filter when the
    /// candidate calls for it. Does nothing outside fallback mode.
    pub fn apply(&self, ctx: &mut SearchContext, candidate: &AddressRecord, literal_text: &str) {
        if !ctx.is_fallback() {
            return;
        }

        if let Some(filter) = self.evaluate(candidate, literal_text) {
            tracing::debug!(
                "Subfield fallback narrowed search to {:?}",
                filter.keys().collect::<Vec<_>>()
            );
            ctx.replace_subfields(filter);
        }
    }

    /// Derive a subfield filter from a normalized candidate.
    ///
    /// Returns `None` when the candidate is precise enough on its own or
    /// carries nothing to filter by.
    pub fn evaluate(&self, candidate: &AddressRecord, literal_text: &str) -> Option<SubfieldFilter> {
        if candidate.has_street() {
            return None;
        }

        let has_components = candidate
            .raw
            .get("address_components")
            .and_then(Value::as_array)
            .is_some_and(|components| !components.is_empty());
        if !has_components {
            return None;
        }

        let primary_type = candidate
            .raw
            .get("types")
            .and_then(|types| types.get(0))
            .and_then(Value::as_str);
        if primary_type.is_some_and(|t| self.settings.is_focused_type(t)) {
            return None;
        }

        let needle = simplify(literal_text);
        let mut filter = SubfieldFilter::new();
        for subfield in FALLBACK_SUBFIELDS {
            let Some(value) = candidate.subfield(subfield) else {
                continue;
            };

            if simplify(value) == needle {
                return Some(SubfieldFilter::new().with(subfield, value));
            }
            filter.insert(subfield, value);
        }

        (!filter.is_empty()).then_some(filter)
    }
}

fn simplify(text: &str) -> String {
    text.trim().to_lowercase()
}
