use proxima_core::models::{Coordinates, Target};
use proxima_core::ports::GeocodeLookup;
use serde::Serialize;
use std::fmt;

use crate::context::SearchContext;
use crate::fallback::SubfieldFallbackResolver;
use crate::settings::SearchSettings;

/// Why a target resolved to the default centre
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DefaultReason {
    /// The geocoder found nothing
    NoCandidate,

    /// The geocoder failed; treated like no candidate
    LookupFailed(String),

    /// The first candidate had no usable coordinates
    MissingGeometry,

    /// The target had a shape that cannot be resolved
    InvalidTarget,
}

impl fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultReason::NoCandidate => write!(f, "no geocoding candidate"),
            DefaultReason::LookupFailed(reason) => write!(f, "geocoding failed: {}", reason),
            DefaultReason::MissingGeometry => write!(f, "candidate has no coordinates"),
            DefaultReason::InvalidTarget => write!(f, "target cannot be resolved"),
        }
    }
}

/// Where resolved coordinates came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    Literal,
    Geocoded,
    Default(DefaultReason),
}

/// Centre point of a proximity search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub coordinates: Coordinates,
    pub source: ResolutionSource,
}

impl Resolution {
    pub fn is_default(&self) -> bool {
        matches!(self.source, ResolutionSource::Default(_))
    }
}

/// Resolves search targets into coordinates
pub struct TargetResolver<'a, G: GeocodeLookup> {
    geocoder: &'a G,
    settings: &'a SearchSettings,
}

impl<'a, G: GeocodeLookup> TargetResolver<'a, G> {
    pub fn new(geocoder: &'a G, settings: &'a SearchSettings) -> Self {
        Self { geocoder, settings }
    }

    /// Resolve a target to a centre point.
    ///
    /// Never fails: anything that cannot be resolved yields the default
    /// centre. A geocoded candidate is normalized, stored in the context,
    /// and may replace the context's subfield option.
    pub async fn resolve(&self, target: &Target, ctx: &mut SearchContext) -> Resolution {
        if let Some(coords) = target.literal_coordinates() {
            return match Coordinates::from_parts(Some(coords.lat), Some(coords.lng)) {
                Some(coordinates) => Resolution {
                    coordinates,
                    source: ResolutionSource::Literal,
                },
                None => self.default_resolution(DefaultReason::InvalidTarget),
            };
        }

        if matches!(target, Target::Unrecognized) {
            return self.default_resolution(DefaultReason::InvalidTarget);
        }

        let raw = match self.geocoder.lookup(target).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.default_resolution(DefaultReason::NoCandidate),
            Err(e) => {
                tracing::warn!("Geocoding lookup failed: {}", e);
                return self.default_resolution(DefaultReason::LookupFailed(e.to_string()));
            }
        };

        let candidate = self.settings.normalizer.normalize(&raw);
        SubfieldFallbackResolver::new(self.settings).apply(ctx, &candidate, target.literal_text());

        let coordinates = candidate.coordinates();
        ctx.set_candidate(candidate);

        match coordinates {
            Some(coordinates) => Resolution {
                coordinates,
                source: ResolutionSource::Geocoded,
            },
            None => self.default_resolution(DefaultReason::MissingGeometry),
        }
    }

    fn default_resolution(&self, reason: DefaultReason) -> Resolution {
        let coordinates = self.settings.default_coordinates;
        tracing::warn!(
            "Using default search centre ({}, {}): {}",
            coordinates.lat,
            coordinates.lng,
            reason
        );
        Resolution {
            coordinates,
            source: ResolutionSource::Default(reason),
        }
    }
}
