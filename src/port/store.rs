//! Raw store port for append-only interval persistence.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Cadence, EntityId, IntervalRecord, TimeRange};
use crate::error::Result;

/// Result of a merge: how many records were net-new, how many were
/// already present, and the span the write touched (for cache
/// invalidation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub inserted: usize,
    pub duplicates: usize,
    /// Half-open span covering every net-new record, `None` when the
    /// merge wrote nothing.
    pub span: Option<TimeRange>,
    /// Entities that received at least one net-new record.
    pub entities: Vec<EntityId>,
}

impl MergeOutcome {
    /// Span covering the given records' intervals.
    #[must_use]
    pub fn span_of(records: &[IntervalRecord]) -> Option<TimeRange> {
        let first = records.first()?;
        let mut start = first.observed_at;
        let mut end = first.observed_at + first.cadence.duration();
        for record in &records[1..] {
            start = start.min(record.observed_at);
            end = end.max(record.observed_at + record.cadence.duration());
        }
        TimeRange::new(start, end).ok()
    }
}

/// Append-only interval persistence, partitioned by entity and native
/// cadence.
///
/// # Invariants
///
/// - Never two records with the same `(entity_id, observed_at, cadence)`.
/// - Merge dedupes against existing records before appending; a key match
///   with a conflicting value is an integrity error, not a replacement.
/// - Writes for one entity are serialized; merges for distinct entities
///   may proceed concurrently.
#[async_trait]
pub trait RawStore: Send + Sync {
    /// Merge records, appending only net-new keys.
    ///
    /// Re-merging already-present records performs zero writes and counts
    /// them as duplicates.
    async fn merge(&self, records: Vec<IntervalRecord>) -> Result<MergeOutcome>;

    /// Records for one entity at its native cadence inside `range`,
    /// ordered by timestamp.
    async fn fetch_range(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        range: &TimeRange,
    ) -> Result<Vec<IntervalRecord>>;

    /// Count of distinct timestamps present for the entity/day.
    async fn count_day(&self, entity: &EntityId, cadence: Cadence, day: NaiveDate) -> Result<usize>;

    /// Every record held for the entity at the given cadence, ordered by
    /// timestamp. Used to materialize the resident backend at bootstrap.
    async fn fetch_all(&self, entity: &EntityId, cadence: Cadence) -> Result<Vec<IntervalRecord>>;
}
