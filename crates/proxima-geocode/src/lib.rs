//! Proxima Geocode - geocoding adapters
//!
//! This crate provides implementations of the `GeocodeLookup` port:
//! an HTTP client for the Google Geocoding API and a static fixture
//! geocoder for tests and offline use.

pub mod fixture;
pub mod google;

pub use fixture::StaticGeocoder;
pub use google::GoogleGeocoder;
