//! Error types for Proxima

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProximaError {
    // Search option errors
    #[error(
        "The \"{handle}\" field does not exist. Please specify a Number field for the `reverseRadius` option."
    )]
    ReverseRadiusFieldMissing { handle: String },

    #[error(
        "The \"{handle}\" field is a {kind} field. Please specify a Number field for the `reverseRadius` option."
    )]
    ReverseRadiusFieldNotNumeric { handle: String, kind: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    #[error("Config file not found at {path}")]
    ConfigFileNotFound { path: PathBuf },

    // Adapter errors
    #[error("Geocoder unavailable: {reason}")]
    GeocodeUnavailable { reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ProximaError {
    /// Whether the error was caused by caller-supplied options or settings
    /// referencing something that does not exist or has the wrong type.
    ///
    /// These are never recovered from silently.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ProximaError::ReverseRadiusFieldMissing { .. }
                | ProximaError::ReverseRadiusFieldNotNumeric { .. }
                | ProximaError::ConfigMissing { .. }
                | ProximaError::ConfigInvalid { .. }
                | ProximaError::ConfigFileNotFound { .. }
        )
    }
}

impl From<serde_json::Error> for ProximaError {
    fn from(err: serde_json::Error) -> Self {
        ProximaError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ProximaError>;
