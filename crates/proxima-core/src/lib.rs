//! Proxima Core - Domain models, configuration, and port definitions
//!
//! This crate contains the shared vocabulary of the proximity search system:
//! search targets, address records, proximity options, the dialect-neutral
//! query AST, and the ports that geocoders and storage engines implement.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{ProximaError, Result};
