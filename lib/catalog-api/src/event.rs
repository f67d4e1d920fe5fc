//! Inbound discovery event and health model

use serde::{Deserialize, Serialize};

/// Status of one live service instance as reported by the health source
///
/// Only `Up` counts as running; every other state contributes nothing to a
/// service's active count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Up,
    Down,
    Starting,
    OutOfService,
    Unknown,
}

/// One live instance of a service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceInstance {
    /// Instance identifier as assigned by the discovery layer
    pub instance_id: String,
    /// Reported instance status
    pub status: InstanceStatus,
}

/// One gateway-route to service-route mapping
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub gateway_url: String,
    pub service_url: String,
}

/// Routing metadata registered by a service, consumed by the URL transformer
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// One service registration or update event
///
/// Carries the per-service metadata plus the family metadata the service
/// advertises for its parent container.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceUpdate {
    /// Service identifier (normalized to lowercase at the cache boundary)
    pub service_id: String,
    /// Identifier of the reporting instance
    pub instance_id: String,
    /// Reported status of the reporting instance
    pub instance_status: InstanceStatus,
    /// Service title
    pub title: String,
    /// Service description
    pub description: String,
    /// Whether the service registered a secure port
    #[serde(default)]
    pub secure: bool,
    /// Advertised home page URL
    pub home_page_url: String,
    /// Advertised family version, raw; parsed during the version merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Family title advertised for the parent container
    pub family_title: String,
    /// Family description advertised for the parent container
    pub family_description: String,
    /// Virtual address the service is routed under
    pub virtual_address: String,
    /// Routing metadata for home page transformation
    #[serde(default)]
    pub routes: RoutingTable,
}
