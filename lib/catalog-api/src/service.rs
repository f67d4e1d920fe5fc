//! Service model

use serde::{Deserialize, Serialize};

/// Health status of a single service family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Up,
    Down,
}

/// One discoverable backend service inside a container
///
/// Identified by its canonical (lowercase) service id; two services with the
/// same id are the same service and the newer registration wins.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Service {
    /// Canonical service identifier
    pub service_id: String,
    /// Human-readable title
    pub title: String,
    /// Human-readable description
    pub description: String,
    /// Whether the service registered a secure port
    #[serde(default)]
    pub secure: bool,
    /// Home page URL, possibly rewritten for routed access
    pub home_page_url: String,
    /// Rolled-up status from the live instance view
    pub status: ServiceStatus,
}
