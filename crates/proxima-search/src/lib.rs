//! Proxima Search - proximity filter construction
//!
//! This crate resolves search targets into coordinates, derives subfield
//! fallback filters from coarse geocoding results, and turns proximity
//! options into joins, computed columns and predicates on a query.

pub mod builder;
pub mod context;
pub mod fallback;
pub mod resolver;
pub mod settings;

pub use builder::{ProximityFilterBuilder, ProximityPlan};
pub use context::SearchContext;
pub use fallback::SubfieldFallbackResolver;
pub use resolver::{DefaultReason, Resolution, ResolutionSource, TargetResolver};
pub use settings::SearchSettings;
