//! Catalog API types shared across the catalog-cache workspace
//!
//! This library defines the data model for the aggregation cache:
//! - Container: a product family grouping one or more services
//! - Service: one discoverable backend service family
//! - SemanticVersion: (major, minor, patch) triple with total ordering
//! - ServiceUpdate: one inbound registration/update event
//! - KeyValue: the (namespace, key, value) triple stored by backends

pub mod container;
pub mod event;
pub mod key_value;
pub mod service;
pub mod version;

pub use container::{Container, ContainerStatus};
pub use event::{InstanceStatus, Route, RoutingTable, ServiceInstance, ServiceUpdate};
pub use key_value::KeyValue;
pub use service::{Service, ServiceStatus};
pub use version::{InvalidVersionFormat, SemanticVersion};
