//! Home page URL transformation collaborator

use catalog_api::RoutingTable;
use thiserror::Error;

/// Raised when a URL cannot be rewritten for routed access
#[derive(Error, Debug)]
#[error("URL transformation failed: {0}")]
pub struct UrlTransformError(pub String);

/// Kind of endpoint a URL is rewritten for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceType {
    Ui,
    Api,
    Ws,
}

/// Rewrites service-advertised URLs to their routed form
///
/// The cache treats failure as recoverable: the original URL is kept and
/// the failure is logged, never propagated.
#[async_trait::async_trait]
pub trait UrlTransformer: Send + Sync {
    async fn transform(
        &self,
        service_type: ServiceType,
        virtual_address: &str,
        url: &str,
        routes: &RoutingTable,
    ) -> Result<String, UrlTransformError>;
}

/// Pass-through transformer for deployments without a routing gateway
pub struct IdentityTransformer;

#[async_trait::async_trait]
impl UrlTransformer for IdentityTransformer {
    async fn transform(
        &self,
        _service_type: ServiceType,
        _virtual_address: &str,
        url: &str,
        _routes: &RoutingTable,
    ) -> Result<String, UrlTransformError> {
        Ok(url.to_string())
    }
}
