//! Proxima Geo - distance math and address normalization
//!
//! This crate turns raw geocoding results into canonical address records
//! and produces great-circle distance expressions for proximity filters.

pub mod formats;
pub mod haversine;
pub mod normalize;

pub use formats::{LocalityOverride, StreetFormatTable};
pub use haversine::{haversine_radius, HaversineCalculator};
pub use normalize::{normalize, AddressNormalizer};
