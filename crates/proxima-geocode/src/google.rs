//! Google Geocoding API client.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use async_trait::async_trait;
use proxima_core::config::LayeredConfig;
use proxima_core::models::Target;
use proxima_core::ports::GeocodeLookup;
use proxima_core::{ProximaError, Result};
use serde_json::Value;

/// Public endpoint of the geocoding API
pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Query components passed through to the API unchanged
const PASSTHROUGH_PARAMS: [&str; 4] = ["components", "region", "language", "bounds"];

/// Geocoder backed by the Google Geocoding API
pub struct GoogleGeocoder {
    /// API key sent with every request
    api_key: String,

    /// Endpoint URL (overridable for tests and proxies)
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl GoogleGeocoder {
    /// Create a geocoder for the public endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a different endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create from configuration; the API key is required
    pub fn from_config(config: &LayeredConfig) -> Result<Self> {
        match config.google_api_key.value.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ProximaError::ConfigMissing {
                key: "google_api_key".to_string(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Query parameters for a target, without the key.
    ///
    /// Returns `None` when the target has no address text to look up.
    pub fn request_params(target: &Target) -> Option<Vec<(String, String)>> {
        match target {
            Target::Address(text) if !text.trim().is_empty() => {
                Some(vec![("address".to_string(), text.clone())])
            }
            Target::Query(query) => {
                let address = query.address()?;
                let mut params = vec![("address".to_string(), address.to_string())];
                for name in PASSTHROUGH_PARAMS {
                    if let Some(value) = query.get(name).filter(|v| !v.trim().is_empty()) {
                        params.push((name.to_string(), value.to_string()));
                    }
                }
                Some(params)
            }
            _ => None,
        }
    }
}

#[async_trait]
impl GeocodeLookup for GoogleGeocoder {
    async fn lookup(&self, target: &Target) -> Result<Option<Value>> {
        let Some(mut params) = Self::request_params(target) else {
            tracing::debug!("Target has no address text, skipping geocode request");
            return Ok(None);
        };
        params.push(("key".to_string(), self.api_key.clone()));

        let url = reqwest::Url::parse_with_params(&self.base_url, &params).map_err(|e| {
            ProximaError::GeocodeUnavailable {
                reason: format!("Invalid geocoding endpoint {}: {}", self.base_url, e),
            }
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProximaError::GeocodeUnavailable {
                reason: format!("Failed to reach geocoding API at {}: {}", self.base_url, e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProximaError::GeocodeUnavailable {
                reason: format!("Geocoding API error ({}): {}", status, error_text),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ProximaError::GeocodeUnavailable {
                reason: format!("Failed to parse geocoding response: {}", e),
            })?;

        parse_response(&body)
    }
}

/// Extract the first result of a geocoding response
pub fn parse_response(body: &Value) -> Result<Option<Value>> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("OK");
    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(None),
        other => {
            let message = body
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("no error message");
            return Err(ProximaError::GeocodeUnavailable {
                reason: format!("Geocoding API returned {}: {}", other, message),
            });
        }
    }

    let results = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or_else(|| ProximaError::GeocodeUnavailable {
            reason: "Geocoding response has no results array".to_string(),
        })?;

    Ok(results.first().cloned())
}
