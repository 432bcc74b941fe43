//! Composed unify → smooth → annualise query execution behind the cache.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{AggregationCache, MaterializedResult};
use crate::domain::{
    Cadence, EntityRegistry, QueryKey, QueryRequest, QueryResponse,
};
use crate::error::{Result, ValidationError};
use crate::pipeline::{annualise, smooth, unify};
use crate::port::RawStore;

/// Serves analytical queries through the aggregation cache.
///
/// The store behind it decides the deployment strategy (resident or
/// on-disk); callers never branch on which is active.
pub struct QueryService {
    store: Arc<dyn RawStore>,
    registry: EntityRegistry,
    cache: Arc<AggregationCache>,
}

impl QueryService {
    pub fn new(
        store: Arc<dyn RawStore>,
        registry: EntityRegistry,
        cache: Arc<AggregationCache>,
    ) -> Self {
        Self {
            store,
            registry,
            cache,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<AggregationCache> {
        &self.cache
    }

    /// Validate and execute a query, deduplicating concurrent identical
    /// requests through the cache.
    pub async fn execute(&self, request: &QueryRequest) -> Result<QueryResponse> {
        request.validate()?;
        for entity in &request.entities {
            let spec = self.registry.resolve(entity)?;
            if !spec.cadence.divides(request.target_cadence) {
                return Err(ValidationError::CadenceMismatch {
                    native_minutes: spec.cadence.minutes(),
                    target_minutes: request.target_cadence.minutes(),
                }
                .into());
            }
        }

        let key = request.key();
        let (result, cache_status) = self
            .cache
            .get_or_compute(key.clone(), || self.compute(&key))
            .await?;

        Ok(QueryResponse {
            points: result.points.clone(),
            coverage_status: result.coverage,
            cache_status,
        })
    }

    /// The full pipeline for one key: per-entity slices from the store,
    /// unification to the target cadence, smoothing in the power domain,
    /// then annualisation. Smoothing strictly precedes annualisation;
    /// the types make the reverse order unrepresentable.
    async fn compute(&self, key: &QueryKey) -> Result<MaterializedResult> {
        let mut inputs: Vec<(Cadence, Vec<crate::domain::IntervalRecord>)> = Vec::new();
        for entity in &key.entities {
            let spec = self.registry.resolve(entity)?;
            let records = self
                .store
                .fetch_range(entity, spec.cadence, &key.range)
                .await?;
            debug!(%entity, records = records.len(), "Fetched raw slice");
            inputs.push((spec.cadence, records));
        }

        let unified = unify(&inputs, key.target_cadence, &key.range)?;
        let smoothed = smooth(&unified, &key.method)?;
        let energy = annualise(&smoothed, key.reference_year_days, key.unit_scale)?;

        Ok(MaterializedResult {
            points: energy
                .points()
                .iter()
                .map(|p| (p.timestamp, p.value))
                .collect(),
            coverage: energy.coverage(),
        })
    }
}
