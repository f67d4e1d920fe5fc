//! Container model

use crate::service::Service;
use crate::version::SemanticVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolled-up status of a container across its services
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContainerStatus {
    Up,
    Down,
    Warning,
}

/// An aggregated product-family catalog entry grouping related services
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Container {
    /// Canonical product family identifier, unique in the cache
    pub id: String,
    /// Family title
    pub title: String,
    /// Family description
    pub description: String,
    /// Highest version seen across registrations, absent until one parses
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<SemanticVersion>,
    /// Rolled-up family status
    pub status: ContainerStatus,
    /// Number of services in the family
    #[serde(default)]
    pub total_services: u32,
    /// Number of services with at least one running instance
    #[serde(default)]
    pub active_services: u32,
    /// When family metadata was last adopted from a registration
    pub last_updated_timestamp: DateTime<Utc>,
    /// Services in the family, unique by service id
    #[serde(default)]
    pub services: Vec<Service>,
}

impl Container {
    /// Look up one service by its canonical id
    pub fn service(&self, service_id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.service_id == service_id)
    }

    /// Whether the container was updated within the given window
    pub fn is_recently_updated(&self, threshold_millis: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_updated_timestamp);
        age <= chrono::Duration::milliseconds(threshold_millis)
    }

    /// Stamp the container as updated now
    pub fn refresh_last_updated(&mut self) {
        self.last_updated_timestamp = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(last_updated: DateTime<Utc>) -> Container {
        Container {
            id: "sysview".to_string(),
            title: "SYSVIEW".to_string(),
            description: "Performance management".to_string(),
            version: None,
            status: ContainerStatus::Up,
            total_services: 0,
            active_services: 0,
            last_updated_timestamp: last_updated,
            services: Vec::new(),
        }
    }

    #[test]
    fn test_recently_updated_within_threshold() {
        let fresh = container(Utc::now());
        assert!(fresh.is_recently_updated(60_000));
    }

    #[test]
    fn test_recently_updated_outside_threshold() {
        let stale = container(Utc::now() - chrono::Duration::milliseconds(5_000));
        assert!(!stale.is_recently_updated(1_000));
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let entry = container(Utc::now());
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"status\":\"UP\""));
    }
}
