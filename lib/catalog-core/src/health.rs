//! Live service health lookup

use catalog_api::ServiceInstance;

/// Source of live instance information, queried by canonical service id
///
/// Implemented by the discovery layer; an unknown service id returns an
/// empty list. The cache wraps every call in its configured timeout, so
/// implementations need not guard their own latency.
#[async_trait::async_trait]
pub trait ServiceHealthSource: Send + Sync {
    /// The known live instances for a service
    async fn instances(&self, service_id: &str) -> Vec<ServiceInstance>;
}
