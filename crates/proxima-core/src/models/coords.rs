use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees (WGS 84)
///
/// Both components are always present together; an absent location is
/// modeled as `Option<Coordinates>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Centre point used when a search target cannot be resolved.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates { lat: 32.3113966, lng: -64.7527469 };

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build coordinates from two optional components.
    ///
    /// Returns `None` unless both are present and finite.
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => {
                Some(Self { lat, lng })
            }
            _ => None,
        }
    }
}

impl Default for Coordinates {
    fn default() -> Self {
        DEFAULT_COORDINATES
    }
}
