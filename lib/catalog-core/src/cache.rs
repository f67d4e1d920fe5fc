//! Container cache fed by service registration events

use crate::config::CacheConfig;
use crate::health::ServiceHealthSource;
use crate::policy;
use crate::transform::{ServiceType, UrlTransformer};
use crate::{CatalogError, Result};
use catalog_api::{
    Container, ContainerStatus, InstanceStatus, KeyValue, SemanticVersion, Service, ServiceStatus,
    ServiceUpdate,
};
use catalog_store::Storage;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time;
use tracing::{debug, warn};

/// Storage namespace holding persisted containers
const CONTAINER_NAMESPACE: &str = "containers";

/// ContainerCache maintains the catalog of product families
///
/// Registration events flow in through `create_or_update_container`; the
/// presentation layer reads the catalog through the query methods. Reads
/// act only on in-memory state. Updates to one family id are serialized
/// through a per-family lock, so independent families never contend, and a
/// family is committed (persisted, then published to readers) as a whole.
pub struct ContainerCache {
    config: CacheConfig,
    containers: RwLock<HashMap<String, Container>>,
    update_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    health: Arc<dyn ServiceHealthSource>,
    transformer: Arc<dyn UrlTransformer>,
    storage: Option<Arc<dyn Storage>>,
}

impl ContainerCache {
    /// Create a cache over the given collaborators, without persistence
    pub fn new(
        config: CacheConfig,
        health: Arc<dyn ServiceHealthSource>,
        transformer: Arc<dyn UrlTransformer>,
    ) -> Self {
        Self {
            config,
            containers: RwLock::new(HashMap::new()),
            update_locks: Mutex::new(HashMap::new()),
            health,
            transformer,
            storage: None,
        }
    }

    /// Persist every committed container through the given storage backend
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Warm-start the catalog from persisted containers
    ///
    /// Entries that no longer decode are skipped with a warning rather than
    /// failing the whole load.
    pub async fn load_persisted(&self) -> Result<usize> {
        let Some(storage) = &self.storage else {
            return Ok(0);
        };

        let entries = storage.list_all(CONTAINER_NAMESPACE).await?;
        let mut containers = self.containers.write().await;
        let mut loaded = 0;
        for entry in entries {
            match serde_json::from_str::<Container>(&entry.value) {
                Ok(container) => {
                    containers.insert(container.id.clone(), container);
                    loaded += 1;
                }
                Err(err) => {
                    warn!("Skipping persisted container {}: {}", entry.key, err);
                }
            }
        }

        debug!("Loaded {} persisted containers", loaded);
        Ok(loaded)
    }

    /// Snapshot of all containers; no cross-call consistency implied
    pub async fn all_containers(&self) -> Vec<Container> {
        let containers = self.containers.read().await;
        containers.values().cloned().collect()
    }

    /// Look up one container by family id
    pub async fn container(&self, family_id: &str) -> Option<Container> {
        let containers = self.containers.read().await;
        containers.get(&canonical_id(family_id)).cloned()
    }

    /// Number of containers in the catalog
    pub async fn container_count(&self) -> usize {
        let containers = self.containers.read().await;
        containers.len()
    }

    /// Look up one service inside a container
    pub async fn container_service(&self, family_id: &str, service_id: &str) -> Option<Service> {
        let service_id = canonical_id(service_id);
        self.container(family_id)
            .await
            .and_then(|container| container.service(&service_id).cloned())
    }

    /// All containers holding the given service
    pub async fn containers_for_service(&self, service_id: &str) -> Vec<Container> {
        let service_id = canonical_id(service_id);
        let containers = self.containers.read().await;
        containers
            .values()
            .filter(|container| {
                container
                    .services
                    .iter()
                    .any(|service| service.service_id == service_id)
            })
            .cloned()
            .collect()
    }

    /// Containers updated within the configured staleness threshold
    ///
    /// Computed on demand from stored timestamps; nothing evicts in the
    /// background.
    pub async fn recently_updated_containers(&self) -> Vec<Container> {
        let threshold_millis = self.config.update_threshold.as_millis() as i64;
        let containers = self.containers.read().await;
        containers
            .values()
            .filter(|container| {
                let recent = container.is_recently_updated(threshold_millis);
                if recent {
                    debug!(
                        "Container {} last updated {} is within threshold",
                        container.id, container.last_updated_timestamp
                    );
                }
                recent
            })
            .cloned()
            .collect()
    }

    /// Apply one registration event to the catalog
    ///
    /// Creates the container on the first event for an unseen family id;
    /// otherwise upserts the service and merges family metadata when the
    /// event carries a strictly higher version. A malformed version skips
    /// only the merge; the service is upserted regardless.
    pub async fn create_or_update_container(
        &self,
        family_id: &str,
        update: &ServiceUpdate,
    ) -> Result<Container> {
        let family_id = canonical_id(family_id);
        let lock = self.family_lock(&family_id).await;
        let _guard = lock.lock().await;

        let existing = {
            let containers = self.containers.read().await;
            containers.get(&family_id).cloned()
        };

        let container = match existing {
            None => {
                let container = self.new_container(&family_id, update).await;
                debug!(
                    "Created container for product family {}: {}",
                    family_id, container.title
                );
                container
            }
            Some(mut container) => {
                let service = self.service_from_update(update).await;
                upsert_service(&mut container.services, service);
                self.merge_family_metadata(&mut container, update);
                container
            }
        };

        self.commit(container.clone()).await?;
        Ok(container)
    }

    /// Upsert one service into an existing container
    ///
    /// Unlike `create_or_update_container` this never creates the family;
    /// an absent family id is a `ContainerNotFound` error.
    pub async fn add_service_to_container(
        &self,
        family_id: &str,
        update: &ServiceUpdate,
    ) -> Result<Container> {
        let family_id = canonical_id(family_id);
        let lock = self.family_lock(&family_id).await;
        let _guard = lock.lock().await;

        let existing = {
            let containers = self.containers.read().await;
            containers.get(&family_id).cloned()
        };
        let Some(mut container) = existing else {
            return Err(CatalogError::ContainerNotFound(family_id));
        };

        let service = self.service_from_update(update).await;
        upsert_service(&mut container.services, service);
        self.commit(container.clone()).await?;
        Ok(container)
    }

    /// Recompute a container's totals and status from live service health
    ///
    /// Every service is checked against the health source under the
    /// configured timeout; a timed-out or instance-less service counts as
    /// down. The refreshed container is committed like any other update.
    pub async fn calculate_container_service_totals(&self, family_id: &str) -> Result<Container> {
        let family_id = canonical_id(family_id);
        let lock = self.family_lock(&family_id).await;
        let _guard = lock.lock().await;

        let existing = {
            let containers = self.containers.read().await;
            containers.get(&family_id).cloned()
        };
        let Some(mut container) = existing else {
            return Err(CatalogError::ContainerNotFound(family_id));
        };

        let checks = container
            .services
            .iter()
            .map(|service| self.service_is_up(&service.service_id));
        let results = futures::future::join_all(checks).await;

        let total = container.services.len();
        let mut active = 0;
        for (service, up) in container.services.iter_mut().zip(results) {
            service.status = if up {
                active += 1;
                ServiceStatus::Up
            } else {
                ServiceStatus::Down
            };
        }

        container.total_services = total as u32;
        container.active_services = active as u32;
        container.status = policy::rollup_status(active, total);
        debug!(
            "Container {} totals: {}/{} active, status {:?}",
            family_id, active, total, container.status
        );

        self.commit(container.clone()).await?;
        Ok(container)
    }

    /// Whether at least one instance of the service reports up
    async fn service_is_up(&self, service_id: &str) -> bool {
        let query = self.health.instances(service_id);
        match time::timeout(self.config.health_timeout, query).await {
            Ok(instances) => instances
                .iter()
                .any(|instance| instance.status == InstanceStatus::Up),
            Err(_) => {
                warn!(
                    "Health query for {} timed out; counting it as down",
                    service_id
                );
                false
            }
        }
    }

    /// Update lock for one family id; independent families get independent
    /// locks so they never serialize against each other
    async fn family_lock(&self, family_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.update_locks.lock().await;
        locks.entry(family_id.to_string()).or_default().clone()
    }

    /// Persist (when a store is attached), then publish to readers
    ///
    /// Ordered this way so a storage failure leaves the in-memory state
    /// untouched and the family is never observable half-updated.
    async fn commit(&self, container: Container) -> Result<()> {
        if let Some(storage) = &self.storage {
            let value = serde_json::to_string(&container)?;
            storage
                .put(KeyValue::new(
                    CONTAINER_NAMESPACE,
                    container.id.clone(),
                    value,
                ))
                .await?;
        }

        let mut containers = self.containers.write().await;
        containers.insert(container.id.clone(), container);
        Ok(())
    }

    async fn new_container(&self, family_id: &str, update: &ServiceUpdate) -> Container {
        let version = match update.version.as_deref() {
            None => None,
            Some(raw) => match raw.parse::<SemanticVersion>() {
                Ok(version) => Some(version),
                Err(err) => {
                    debug!("Container {} created without version: {}", family_id, err);
                    None
                }
            },
        };

        let service = self.service_from_update(update).await;
        Container {
            id: family_id.to_string(),
            title: update.family_title.clone(),
            description: update.family_description.clone(),
            version,
            status: ContainerStatus::Up,
            total_services: 0,
            active_services: 0,
            last_updated_timestamp: Utc::now(),
            services: vec![service],
        }
    }

    /// Adopt the event's family metadata when it carries a strictly higher
    /// version; a malformed version aborts only this sub-step
    fn merge_family_metadata(&self, container: &mut Container, update: &ServiceUpdate) {
        match policy::adopted_version(update.version.as_deref(), container.version.as_ref()) {
            Ok(Some(version)) => {
                debug!("Container {} adopted version {}", container.id, version);
                container.version = Some(version);
                container.title = update.family_title.clone();
                container.description = update.family_description.clone();
                container.refresh_last_updated();
            }
            Ok(None) => {}
            Err(err) => {
                debug!("Skipping version merge for {}: {}", container.id, err);
            }
        }
    }

    async fn service_from_update(&self, update: &ServiceUpdate) -> Service {
        Service {
            service_id: canonical_id(&update.service_id),
            title: update.title.clone(),
            description: update.description.clone(),
            secure: update.secure,
            home_page_url: self.resolve_home_page(update).await,
            status: ServiceStatus::Up,
        }
    }

    /// Transform the advertised home page for routed access, keeping the
    /// advertised URL when transformation fails or times out
    async fn resolve_home_page(&self, update: &ServiceUpdate) -> String {
        let advertised = update.home_page_url.clone();
        if advertised.is_empty() {
            return advertised;
        }

        let transformed = time::timeout(
            self.config.transform_timeout,
            self.transformer.transform(
                ServiceType::Ui,
                &update.virtual_address,
                &advertised,
                &update.routes,
            ),
        )
        .await;

        match transformed {
            Ok(Ok(url)) => url,
            Ok(Err(err)) => {
                warn!(
                    "Home page transformation failed for {}: {}; keeping advertised URL",
                    update.service_id, err
                );
                advertised
            }
            Err(_) => {
                warn!(
                    "Home page transformation for {} timed out; keeping advertised URL",
                    update.service_id
                );
                advertised
            }
        }
    }
}

/// Family and service ids are matched case-insensitively everywhere, so
/// normalize once at the boundary
fn canonical_id(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Replace the service with the same id or append a new one
fn upsert_service(services: &mut Vec<Service>, service: Service) {
    match services
        .iter_mut()
        .find(|existing| existing.service_id == service.service_id)
    {
        Some(existing) => *existing = service,
        None => services.push(service),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{IdentityTransformer, UrlTransformError};
    use catalog_api::{RoutingTable, ServiceInstance};
    use catalog_store::{MemoryStorage, StorageError};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct MockHealth {
        instances: RwLock<HashMap<String, Vec<ServiceInstance>>>,
    }

    impl MockHealth {
        async fn set(&self, service_id: &str, statuses: Vec<InstanceStatus>) {
            let instances = statuses
                .into_iter()
                .enumerate()
                .map(|(i, status)| ServiceInstance {
                    instance_id: format!("{}:{}", service_id, i),
                    status,
                })
                .collect();
            self.instances
                .write()
                .await
                .insert(service_id.to_string(), instances);
        }
    }

    #[async_trait::async_trait]
    impl ServiceHealthSource for MockHealth {
        async fn instances(&self, service_id: &str) -> Vec<ServiceInstance> {
            self.instances
                .read()
                .await
                .get(service_id)
                .cloned()
                .unwrap_or_default()
        }
    }

    struct BlockedHealth {
        release: Notify,
    }

    #[async_trait::async_trait]
    impl ServiceHealthSource for BlockedHealth {
        async fn instances(&self, _service_id: &str) -> Vec<ServiceInstance> {
            self.release.notified().await;
            Vec::new()
        }
    }

    struct FailingTransformer;

    #[async_trait::async_trait]
    impl UrlTransformer for FailingTransformer {
        async fn transform(
            &self,
            _service_type: ServiceType,
            _virtual_address: &str,
            _url: &str,
            _routes: &RoutingTable,
        ) -> std::result::Result<String, UrlTransformError> {
            Err(UrlTransformError("no route matches".to_string()))
        }
    }

    struct GatewayTransformer;

    #[async_trait::async_trait]
    impl UrlTransformer for GatewayTransformer {
        async fn transform(
            &self,
            _service_type: ServiceType,
            virtual_address: &str,
            _url: &str,
            _routes: &RoutingTable,
        ) -> std::result::Result<String, UrlTransformError> {
            Ok(format!("https://gateway/ui/v1/{}", virtual_address))
        }
    }

    struct FailingStorage;

    #[async_trait::async_trait]
    impl Storage for FailingStorage {
        async fn get(
            &self,
            _namespace: &str,
            _key: &str,
        ) -> catalog_store::Result<Option<String>> {
            Err(StorageError::Unavailable("backend is down".to_string()))
        }

        async fn put(&self, _entry: KeyValue) -> catalog_store::Result<()> {
            Err(StorageError::Unavailable("backend is down".to_string()))
        }

        async fn delete(&self, _namespace: &str, _key: &str) -> catalog_store::Result<()> {
            Err(StorageError::Unavailable("backend is down".to_string()))
        }

        async fn list_all(&self, _namespace: &str) -> catalog_store::Result<Vec<KeyValue>> {
            Err(StorageError::Unavailable("backend is down".to_string()))
        }
    }

    fn update(service_id: &str, version: Option<&str>) -> ServiceUpdate {
        ServiceUpdate {
            service_id: service_id.to_string(),
            instance_id: format!("{}:1", service_id),
            instance_status: InstanceStatus::Up,
            title: format!("{} title", service_id),
            description: format!("{} description", service_id),
            secure: false,
            home_page_url: format!("https://{}.internal/ui", service_id),
            version: version.map(str::to_string),
            family_title: "Family title".to_string(),
            family_description: "Family description".to_string(),
            virtual_address: service_id.to_string(),
            routes: RoutingTable::default(),
        }
    }

    fn cache(health: Arc<dyn ServiceHealthSource>) -> ContainerCache {
        ContainerCache::new(CacheConfig::default(), health, Arc::new(IdentityTransformer))
    }

    fn mock_cache() -> (Arc<MockHealth>, ContainerCache) {
        let health = Arc::new(MockHealth::default());
        let cache = cache(health.clone());
        (health, cache)
    }

    #[tokio::test]
    async fn test_first_event_creates_container() {
        let (_, cache) = mock_cache();

        let container = cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();

        assert_eq!(container.id, "sysview");
        assert_eq!(container.status, ContainerStatus::Up);
        assert_eq!(container.title, "Family title");
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
        assert_eq!(container.services.len(), 1);
        assert_eq!(container.services[0].service_id, "service1");
        assert_eq!(cache.container_count().await, 1);
    }

    #[tokio::test]
    async fn test_lower_version_upserts_service_but_keeps_metadata() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();

        let mut second = update("service2", Some("0.9.0"));
        second.family_title = "Older family title".to_string();
        let container = cache
            .create_or_update_container("sysview", &second)
            .await
            .unwrap();

        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
        assert_eq!(container.title, "Family title");
        assert_eq!(container.services.len(), 2);
    }

    #[tokio::test]
    async fn test_higher_version_adopts_family_metadata() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();

        let mut newer = update("service1", Some("1.1.0"));
        newer.family_title = "Newer family title".to_string();
        newer.family_description = "Newer family description".to_string();
        let container = cache
            .create_or_update_container("sysview", &newer)
            .await
            .unwrap();

        assert_eq!(container.version, Some("1.1.0".parse().unwrap()));
        assert_eq!(container.title, "Newer family title");
        assert_eq!(container.description, "Newer family description");
        assert_eq!(container.services.len(), 1);
    }

    #[tokio::test]
    async fn test_version_is_monotonic_across_update_sequences() {
        let (_, cache) = mock_cache();

        for version in ["1.0.0", "2.0.0", "1.5.0", "0.1.0", "2.0.0"] {
            cache
                .create_or_update_container("sysview", &update("service1", Some(version)))
                .await
                .unwrap();
        }

        let container = cache.container("sysview").await.unwrap();
        assert_eq!(container.version, Some("2.0.0".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_malformed_version_still_upserts_service() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();
        let container = cache
            .create_or_update_container("sysview", &update("service2", Some("latest")))
            .await
            .unwrap();

        assert_eq!(container.services.len(), 2);
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_idempotent_upsert() {
        let (_, cache) = mock_cache();

        let event = update("service1", Some("1.0.0"));
        cache
            .create_or_update_container("sysview", &event)
            .await
            .unwrap();
        let container = cache
            .create_or_update_container("sysview", &event)
            .await
            .unwrap();

        assert_eq!(container.services.len(), 1);
        let service = &container.services[0];
        assert_eq!(service.title, "service1 title");
        assert_eq!(service.home_page_url, "https://service1.internal/ui");
    }

    #[tokio::test]
    async fn test_reregistration_replaces_service_fields() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();

        let mut changed = update("service1", None);
        changed.title = "Renamed service".to_string();
        changed.secure = true;
        let container = cache
            .create_or_update_container("sysview", &changed)
            .await
            .unwrap();

        assert_eq!(container.services.len(), 1);
        assert_eq!(container.services[0].title, "Renamed service");
        assert!(container.services[0].secure);
    }

    #[tokio::test]
    async fn test_family_and_service_ids_are_normalized() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("SysView", &update("Service1", Some("1.0.0")))
            .await
            .unwrap();

        assert!(cache.container("SYSVIEW").await.is_some());
        assert!(cache
            .container_service("sysview", "SERVICE1")
            .await
            .is_some());
        assert_eq!(cache.containers_for_service("sErViCe1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_service_to_missing_container_is_an_error() {
        let (_, cache) = mock_cache();

        let err = cache
            .add_service_to_container("ghost", &update("service1", None))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::ContainerNotFound(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_add_service_to_existing_container() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();
        let container = cache
            .add_service_to_container("sysview", &update("service2", None))
            .await
            .unwrap();

        assert_eq!(container.services.len(), 2);
        // Family metadata is untouched by a plain service add.
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_totals_for_missing_container_is_an_error() {
        let (_, cache) = mock_cache();
        let err = cache
            .calculate_container_service_totals("ghost")
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::ContainerNotFound(_)));
    }

    #[tokio::test]
    async fn test_scenario_second_service_down_rolls_up_warning() {
        let (health, cache) = mock_cache();

        let container = cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();
        assert_eq!(container.status, ContainerStatus::Up);
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
        assert_eq!(container.services.len(), 1);

        let container = cache
            .create_or_update_container("sysview", &update("service2", Some("0.9.0")))
            .await
            .unwrap();
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
        assert_eq!(container.services.len(), 2);

        health
            .set("service1", vec![InstanceStatus::Down, InstanceStatus::Starting])
            .await;
        health.set("service2", vec![InstanceStatus::Up]).await;

        let container = cache
            .calculate_container_service_totals("sysview")
            .await
            .unwrap();
        assert_eq!(container.status, ContainerStatus::Warning);
        assert_eq!(container.total_services, 2);
        assert_eq!(container.active_services, 1);
        assert_eq!(
            container.service("service1").unwrap().status,
            ServiceStatus::Down
        );
        assert_eq!(
            container.service("service2").unwrap().status,
            ServiceStatus::Up
        );
    }

    #[tokio::test]
    async fn test_totals_all_down_and_all_up() {
        let (health, cache) = mock_cache();

        cache
            .create_or_update_container("sysview", &update("service1", None))
            .await
            .unwrap();
        cache
            .create_or_update_container("sysview", &update("service2", None))
            .await
            .unwrap();

        let container = cache
            .calculate_container_service_totals("sysview")
            .await
            .unwrap();
        // No instances known at all.
        assert_eq!(container.status, ContainerStatus::Down);
        assert_eq!(container.active_services, 0);

        health.set("service1", vec![InstanceStatus::Up]).await;
        health.set("service2", vec![InstanceStatus::Up]).await;
        let container = cache
            .calculate_container_service_totals("sysview")
            .await
            .unwrap();
        assert_eq!(container.status, ContainerStatus::Up);
        assert_eq!(container.active_services, 2);
    }

    #[tokio::test]
    async fn test_health_timeout_counts_service_down() {
        let health = Arc::new(BlockedHealth {
            release: Notify::new(),
        });
        let config = CacheConfig {
            health_timeout: Duration::from_millis(50),
            ..CacheConfig::default()
        };
        let cache = ContainerCache::new(config, health, Arc::new(IdentityTransformer));

        cache
            .create_or_update_container("sysview", &update("service1", None))
            .await
            .unwrap();

        let container = cache
            .calculate_container_service_totals("sysview")
            .await
            .unwrap();
        assert_eq!(container.status, ContainerStatus::Down);
        assert_eq!(
            container.service("service1").unwrap().status,
            ServiceStatus::Down
        );
    }

    #[tokio::test]
    async fn test_transform_failure_keeps_advertised_url() {
        let cache = ContainerCache::new(
            CacheConfig::default(),
            Arc::new(MockHealth::default()),
            Arc::new(FailingTransformer),
        );

        let container = cache
            .create_or_update_container("sysview", &update("service1", None))
            .await
            .unwrap();

        assert_eq!(
            container.services[0].home_page_url,
            "https://service1.internal/ui"
        );
    }

    #[tokio::test]
    async fn test_transform_rewrites_home_page() {
        let cache = ContainerCache::new(
            CacheConfig::default(),
            Arc::new(MockHealth::default()),
            Arc::new(GatewayTransformer),
        );

        let container = cache
            .create_or_update_container("sysview", &update("service1", None))
            .await
            .unwrap();

        assert_eq!(
            container.services[0].home_page_url,
            "https://gateway/ui/v1/service1"
        );
    }

    #[tokio::test]
    async fn test_empty_home_page_is_not_transformed() {
        let cache = ContainerCache::new(
            CacheConfig::default(),
            Arc::new(MockHealth::default()),
            Arc::new(GatewayTransformer),
        );

        let mut event = update("service1", None);
        event.home_page_url = String::new();
        let container = cache
            .create_or_update_container("sysview", &event)
            .await
            .unwrap();

        assert_eq!(container.services[0].home_page_url, "");
    }

    #[tokio::test]
    async fn test_recently_updated_filters_stale_containers() {
        let (_, cache) = mock_cache();

        cache
            .create_or_update_container("fresh", &update("service1", None))
            .await
            .unwrap();

        // Plant a container whose last update predates the threshold.
        let mut stale = cache.container("fresh").await.unwrap();
        stale.id = "stale".to_string();
        stale.last_updated_timestamp = Utc::now() - chrono::Duration::milliseconds(120_000);
        cache
            .containers
            .write()
            .await
            .insert(stale.id.clone(), stale);

        let recent = cache.recently_updated_containers().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, "fresh");
        assert_eq!(cache.container_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_distinct_families() {
        let (_, cache) = mock_cache();
        let cache = Arc::new(cache);

        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let family = format!("family{}", i);
                cache
                    .create_or_update_container(&family, &update("service1", Some("1.0.0")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(cache.container_count().await, 16);
    }

    #[tokio::test]
    async fn test_concurrent_updates_to_one_family_serialize() {
        let (_, cache) = mock_cache();
        let cache = Arc::new(cache);

        let mut handles = Vec::new();
        for i in 1..=10u64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let event = update("service1", Some(&format!("{}.0.0", i)));
                cache
                    .create_or_update_container("sysview", &event)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let container = cache.container("sysview").await.unwrap();
        // Whatever the interleaving, the monotonic merge keeps the maximum.
        assert_eq!(container.version, Some(SemanticVersion::new(10, 0, 0)));
        assert_eq!(container.services.len(), 1);
    }

    #[tokio::test]
    async fn test_independent_family_proceeds_while_another_is_held() {
        let health = Arc::new(BlockedHealth {
            release: Notify::new(),
        });
        let config = CacheConfig {
            health_timeout: Duration::from_secs(30),
            ..CacheConfig::default()
        };
        let cache = Arc::new(ContainerCache::new(
            config,
            health.clone(),
            Arc::new(IdentityTransformer),
        ));

        cache
            .create_or_update_container("alpha", &update("service-a", None))
            .await
            .unwrap();
        cache
            .create_or_update_container("beta", &update("service-b", None))
            .await
            .unwrap();

        // Hold alpha's update lock inside a blocked health query.
        let totals = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.calculate_container_service_totals("alpha").await })
        };
        time::sleep(Duration::from_millis(50)).await;

        // Beta must not wait for alpha.
        time::timeout(
            Duration::from_millis(500),
            cache.create_or_update_container("beta", &update("service-b2", None)),
        )
        .await
        .expect("independent family was blocked")
        .unwrap();

        health.release.notify_one();
        totals.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_committed_containers_are_persisted_and_reloadable() {
        let storage = Arc::new(MemoryStorage::new());
        let health = Arc::new(MockHealth::default());
        let cache = ContainerCache::new(
            CacheConfig::default(),
            health.clone(),
            Arc::new(IdentityTransformer),
        )
        .with_storage(storage.clone());

        cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap();

        let restored = ContainerCache::new(
            CacheConfig::default(),
            health,
            Arc::new(IdentityTransformer),
        )
        .with_storage(storage);
        assert_eq!(restored.load_persisted().await.unwrap(), 1);

        let container = restored.container("sysview").await.unwrap();
        assert_eq!(container.version, Some("1.0.0".parse().unwrap()));
        assert_eq!(container.services.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_leaves_no_partial_state() {
        let health = Arc::new(MockHealth::default());
        let cache = ContainerCache::new(
            CacheConfig::default(),
            health,
            Arc::new(IdentityTransformer),
        )
        .with_storage(Arc::new(FailingStorage));

        let err = cache
            .create_or_update_container("sysview", &update("service1", Some("1.0.0")))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CatalogError::Storage(StorageError::Unavailable(_))
        ));
        assert_eq!(cache.container_count().await, 0);
    }
}
