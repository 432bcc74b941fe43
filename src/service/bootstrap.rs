//! Deployment-time assembly of store, cache and query service.

use std::sync::Arc;

use tracing::info;

use crate::adapter::archive::HttpArchive;
use crate::adapter::store::db::{create_pool, run_migrations};
use crate::adapter::store::{ResidentRawStore, SqliteRawStore};
use crate::cache::AggregationCache;
use crate::config::{Config, StoreStrategy};
use crate::error::Result;
use crate::pipeline::{BackfillReconciler, IntegrityAuditor};
use crate::port::RawStore;
use crate::service::QueryService;

/// Open the configured raw store.
///
/// Eager deployments materialize the full dataset into a resident store
/// (writes still land on disk first); lazy deployments read slices from
/// SQLite per request. Either way the caller holds one `RawStore`.
pub async fn build_store(config: &Config) -> Result<Arc<dyn RawStore>> {
    if let Some(parent) = config.store.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let pool = create_pool(&config.store.database_url())?;
    run_migrations(&pool)?;
    let disk = SqliteRawStore::new(pool);

    match config.store.strategy {
        StoreStrategy::Lazy => {
            info!(path = %config.store.database_path.display(), "Using lazy on-disk store");
            Ok(Arc::new(disk))
        }
        StoreStrategy::Eager => {
            let resident = ResidentRawStore::load(disk, &config.registry()).await?;
            info!(
                records = resident.resident_len(),
                "Materialized resident store"
            );
            Ok(Arc::new(resident))
        }
    }
}

/// Assemble the query service with its explicitly constructed cache.
pub async fn build_query_service(config: &Config) -> Result<QueryService> {
    let store = build_store(config).await?;
    let cache = Arc::new(AggregationCache::new(&config.cache));
    Ok(QueryService::new(store, config.registry(), cache))
}

/// Assemble the auditor over the configured store.
pub async fn build_auditor(config: &Config) -> Result<IntegrityAuditor<dyn RawStore>> {
    let store = build_store(config).await?;
    Ok(IntegrityAuditor::new(store, config.registry()))
}

/// Assemble the reconciler against the HTTP archive, sharing the given
/// store and invalidating the given cache on merges.
pub fn build_reconciler(
    config: &Config,
    store: Arc<dyn RawStore>,
    cache: Arc<AggregationCache>,
) -> BackfillReconciler<dyn RawStore, HttpArchive> {
    let timeout = std::time::Duration::from_millis(config.backfill.fetch_timeout_ms);
    let archive = Arc::new(HttpArchive::from_config(&config.archive, timeout));
    BackfillReconciler::new(store, archive, config.registry(), config.backfill.clone())
        .with_cache(cache)
}
