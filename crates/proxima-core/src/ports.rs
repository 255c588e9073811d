//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod fields;
pub mod geocode;
pub mod query;

pub use fields::FieldResolver;
pub use geocode::GeocodeLookup;
pub use query::QueryBuilder;
