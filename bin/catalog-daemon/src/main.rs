use anyhow::Result;
use catalog_api::{InstanceStatus, ServiceInstance, ServiceUpdate};
use catalog_core::{CacheConfig, ContainerCache, IdentityTransformer, ServiceHealthSource};
use catalog_store::MemoryStorage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info};
use tracing_subscriber::fmt::init as tracing_init;

/// Health view fed by the registration events themselves: each event
/// refreshes the reporting instance's status for its service.
#[derive(Default)]
struct EventHealthSource {
    instances: RwLock<HashMap<String, HashMap<String, InstanceStatus>>>,
}

impl EventHealthSource {
    async fn observe(&self, update: &ServiceUpdate) {
        let mut instances = self.instances.write().await;
        instances
            .entry(update.service_id.to_lowercase())
            .or_default()
            .insert(update.instance_id.clone(), update.instance_status);
    }
}

#[async_trait::async_trait]
impl ServiceHealthSource for EventHealthSource {
    async fn instances(&self, service_id: &str) -> Vec<ServiceInstance> {
        let instances = self.instances.read().await;
        instances
            .get(service_id)
            .map(|known| {
                known
                    .iter()
                    .map(|(instance_id, status)| ServiceInstance {
                        instance_id: instance_id.clone(),
                        status: *status,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting catalog-daemon...");

    let config = CacheConfig {
        update_threshold: update_threshold_from_env(),
        ..CacheConfig::default()
    };
    info!("Staleness threshold: {:?}", config.update_threshold);

    let health = Arc::new(EventHealthSource::default());
    let cache = Arc::new(
        ContainerCache::new(config, health.clone(), Arc::new(IdentityTransformer))
            .with_storage(Arc::new(MemoryStorage::new())),
    );
    let loaded = cache.load_persisted().await?;
    info!("Container cache initialized ({} persisted containers)", loaded);

    // The discovery client plugs in here: it owns the sender half and
    // emits one (family id, update) pair per registration event.
    let (_events_tx, mut events_rx) = mpsc::channel::<(String, ServiceUpdate)>(64);

    {
        let cache = cache.clone();
        let health = health.clone();
        tokio::spawn(async move {
            while let Some((family_id, update)) = events_rx.recv().await {
                health.observe(&update).await;
                match cache.create_or_update_container(&family_id, &update).await {
                    Ok(container) => {
                        debug!(
                            "Applied update for {}/{} ({} services)",
                            container.id,
                            update.service_id,
                            container.services.len()
                        );
                    }
                    Err(e) => {
                        error!("Error applying update for {}: {}", family_id, e);
                    }
                }
            }
        });
    }

    // Periodic rollup loop
    loop {
        tokio::time::sleep(Duration::from_secs(30)).await;

        for container in cache.all_containers().await {
            if let Err(e) = cache.calculate_container_service_totals(&container.id).await {
                error!("Error recomputing totals for {}: {}", container.id, e);
            }
        }

        let recent = cache.recently_updated_containers().await.len();
        info!(
            "Catalog has {} containers, {} recently updated",
            cache.container_count().await,
            recent
        );
    }
}

fn update_threshold_from_env() -> Duration {
    match std::env::var("CATALOG_UPDATE_THRESHOLD_MS") {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(millis) => Duration::from_millis(millis),
            Err(_) => {
                error!(
                    "Ignoring unparseable CATALOG_UPDATE_THRESHOLD_MS={:?}",
                    raw
                );
                CacheConfig::default().update_threshold
            }
        },
        Err(_) => CacheConfig::default().update_threshold,
    }
}
