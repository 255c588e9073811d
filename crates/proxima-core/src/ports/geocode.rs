use async_trait::async_trait;

use crate::error::Result;
use crate::models::Target;

/// Port for geocoding a search target
///
/// Implementations perform the (possibly slow, possibly failing) provider
/// request. Retry, backoff and caching are the implementation's concern.
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    /// Look up a target and return the provider's first candidate
    ///
    /// # Returns
    /// The raw result payload (`address_components`, `geometry`, `types`),
    /// or `None` when the provider found nothing or the target carries no
    /// address text
    async fn lookup(&self, target: &Target) -> Result<Option<serde_json::Value>>;
}

#[async_trait]
impl<T: GeocodeLookup + ?Sized> GeocodeLookup for Box<T> {
    async fn lookup(&self, target: &Target) -> Result<Option<serde_json::Value>> {
        (**self).lookup(target).await
    }
}
