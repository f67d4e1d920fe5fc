//! Cache configuration

use std::time::Duration;

/// Configuration for the container cache
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Window within which a container counts as recently updated
    pub update_threshold: Duration,
    /// Timeout for a single health-source query
    pub health_timeout: Duration,
    /// Timeout for a single home page transformation
    pub transform_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            update_threshold: Duration::from_millis(60_000),
            health_timeout: Duration::from_secs(5),
            transform_timeout: Duration::from_secs(2),
        }
    }
}
