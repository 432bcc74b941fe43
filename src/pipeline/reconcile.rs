//! Backfill reconciliation against the interval archive.
//!
//! Uses audit gaps to pull missing day ranges from the archive
//! collaborator and merge them into the raw store without duplication.
//! Fetches for independent days run concurrently under a bounded worker
//! limit; merges go through the store's per-entity write discipline.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::stream::{self, StreamExt};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::audit::{day_range, IntegrityAuditor};
use crate::cache::AggregationCache;
use crate::config::BackfillConfig;
use crate::domain::{Cadence, DayCoverage, EntityId, EntityRegistry, IntervalRecord, SourceId};
use crate::error::Result;
use crate::port::{ArchiveClient, MergeOutcome, RawStore};

/// Outcome of one reconciliation batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileResult {
    /// Days that received at least one net-new record.
    pub filled_days: Vec<NaiveDate>,
    /// Days whose archive fetch kept failing after bounded retries.
    pub unresolved_days: Vec<NaiveDate>,
    /// Net-new records merged across the batch.
    pub inserted: usize,
    /// Records the archive re-delivered that were already present.
    pub duplicates: usize,
}

/// Pulls missing days from the archive and merges them into the store.
pub struct BackfillReconciler<S, A>
where
    S: RawStore + ?Sized,
    A: ArchiveClient + ?Sized,
{
    store: Arc<S>,
    archive: Arc<A>,
    registry: EntityRegistry,
    config: BackfillConfig,
    cache: Option<Arc<AggregationCache>>,
}

impl<S, A> BackfillReconciler<S, A>
where
    S: RawStore + ?Sized,
    A: ArchiveClient + ?Sized,
{
    pub fn new(
        store: Arc<S>,
        archive: Arc<A>,
        registry: EntityRegistry,
        config: BackfillConfig,
    ) -> Self {
        Self {
            store,
            archive,
            registry,
            config,
            cache: None,
        }
    }

    /// Invalidate overlapping aggregation cache entries whenever a merge
    /// lands new data.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<AggregationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Reconcile one entity across an inclusive day range.
    ///
    /// Idempotent: a day already audited complete performs zero writes.
    /// A transient fetch failure exhausting its retries leaves the day in
    /// `unresolved_days` and the batch continues; a data-integrity
    /// conflict aborts the entity's write path and surfaces to the
    /// operator.
    pub async fn reconcile(
        &self,
        entity: &EntityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ReconcileResult> {
        let spec = self.registry.resolve(entity)?.clone();
        let auditor = IntegrityAuditor::new(Arc::clone(&self.store), self.registry.clone());

        let mut gap_days = Vec::new();
        for day in day_range(from, to) {
            let report = auditor.audit(entity, day).await?;
            if report.status == DayCoverage::Complete {
                debug!(%entity, %day, "Day already complete, skipping");
            } else {
                gap_days.push(day);
            }
        }

        if gap_days.is_empty() {
            info!(%entity, %from, %to, "Nothing to reconcile");
            return Ok(ReconcileResult::default());
        }

        info!(
            %entity,
            days = gap_days.len(),
            workers = self.config.max_concurrent_fetches,
            "Reconciling gap days from archive"
        );

        // Fetches fan out under the worker limit; merges stay on this
        // task so the entity sees one writer.
        let fetches = stream::iter(gap_days.into_iter().map(|day| {
            let source = spec.source.clone();
            async move { (day, self.fetch_with_retry(&source, day).await) }
        }))
        .buffer_unordered(self.config.max_concurrent_fetches)
        .collect::<Vec<_>>()
        .await;

        let mut result = ReconcileResult::default();
        for (day, fetched) in fetches {
            match fetched {
                Ok(records) => {
                    let outcome = self.merge_day(entity, spec.cadence, day, records).await?;
                    result.inserted += outcome.inserted;
                    result.duplicates += outcome.duplicates;
                    if outcome.inserted > 0 {
                        result.filled_days.push(day);
                    }
                }
                Err(err) => {
                    warn!(%entity, %day, error = %err, "Archive day unresolved after retries");
                    result.unresolved_days.push(day);
                }
            }
        }

        result.filled_days.sort_unstable();
        result.unresolved_days.sort_unstable();
        Ok(result)
    }

    /// Reconcile every entity fed by `source` across an inclusive range.
    pub async fn reconcile_source(
        &self,
        source: &SourceId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(EntityId, ReconcileResult)>> {
        let entities: Vec<EntityId> = self
            .registry
            .entities_for_source(source)
            .into_iter()
            .map(|spec| spec.entity_id.clone())
            .collect();

        let mut results = Vec::new();
        for entity in entities {
            let result = self.reconcile(&entity, from, to).await?;
            results.push((entity, result));
        }
        Ok(results)
    }

    async fn merge_day(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        day: NaiveDate,
        records: Vec<IntervalRecord>,
    ) -> Result<MergeOutcome> {
        // The archive hands back the whole source day; keep only this
        // entity's records at its declared cadence. A short day is merged
        // as-is and left partial rather than padded.
        let own: Vec<IntervalRecord> = records
            .into_iter()
            .filter(|r| &r.entity_id == entity && r.cadence == cadence && r.day() == day)
            .collect();

        if own.is_empty() {
            debug!(%entity, %day, "Archive returned no records for entity");
            return Ok(MergeOutcome::default());
        }

        let expected = cadence.expected_per_day();
        if own.len() < expected {
            debug!(
                %entity,
                %day,
                fetched = own.len(),
                expected,
                "Merging short archive day, leaving it partial"
            );
        }

        let outcome = self.store.merge(own).await?;
        info!(
            %entity,
            %day,
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Merged archive day"
        );

        if let (Some(cache), Some(span)) = (&self.cache, outcome.span) {
            let evicted = cache.invalidate_overlapping(&outcome.entities, &span);
            if evicted > 0 {
                debug!(evicted, "Invalidated overlapping cache entries");
            }
        }

        Ok(outcome)
    }

    /// Fetch one archive day, retrying transient failures with
    /// exponential backoff and jitter. Every attempt carries a timeout so
    /// a hung fetch converts into an unresolved gap instead of stalling
    /// the batch.
    async fn fetch_with_retry(
        &self,
        source: &SourceId,
        day: NaiveDate,
    ) -> Result<Vec<IntervalRecord>> {
        let timeout = Duration::from_millis(self.config.fetch_timeout_ms);
        let mut delay_ms = self.config.initial_delay_ms;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let outcome = tokio::time::timeout(timeout, self.archive.fetch(source, day)).await;
            let err = match outcome {
                Ok(Ok(records)) => return Ok(records),
                Ok(Err(err)) => err,
                Err(_) => crate::error::ArchiveError::Timeout {
                    timeout_ms: self.config.fetch_timeout_ms,
                }
                .into(),
            };

            if attempt >= self.config.max_attempts {
                return Err(err);
            }

            let jitter = rand::thread_rng().gen_range(0..=delay_ms / 5);
            let backoff = Duration::from_millis(delay_ms + jitter);
            warn!(
                %source,
                %day,
                attempt,
                error = %err,
                delay_ms = backoff.as_millis() as u64,
                "Archive fetch failed, backing off"
            );
            sleep(backoff).await;

            delay_ms = ((delay_ms as f64 * self.config.backoff_multiplier) as u64)
                .min(self.config.max_delay_ms);
        }
    }
}
