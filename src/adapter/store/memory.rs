//! Resident in-memory raw store.
//!
//! Backs the eager deployment strategy: the full dataset is held in
//! memory, partitioned by (entity, native cadence). Each partition locks
//! independently, so merges for distinct entities proceed concurrently
//! while writes within one entity stay serialized.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;

use super::VALUE_TOLERANCE;
use crate::domain::{Cadence, EntityId, IntervalRecord, TimeRange};
use crate::error::{IntegrityError, Result};
use crate::port::{MergeOutcome, RawStore};

type Partition = BTreeMap<DateTime<Utc>, f64>;

/// In-memory store, also the workhorse of unit and pipeline tests.
#[derive(Debug, Default)]
pub struct MemoryRawStore {
    partitions: DashMap<(EntityId, Cadence), Partition>,
}

impl MemoryRawStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RawStore for MemoryRawStore {
    async fn merge(&self, records: Vec<IntervalRecord>) -> Result<MergeOutcome> {
        let mut groups: BTreeMap<(EntityId, Cadence), Vec<IntervalRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry((record.entity_id.clone(), record.cadence))
                .or_default()
                .push(record);
        }

        let mut outcome = MergeOutcome::default();
        let mut merged_spans: Vec<IntervalRecord> = Vec::new();

        for ((entity, cadence), group) in groups {
            let mut partition = self
                .partitions
                .entry((entity.clone(), cadence))
                .or_default();

            // Conflict scan first so a conflicting batch writes nothing
            // for this entity.
            for record in &group {
                if let Some(&stored) = partition.get(&record.observed_at) {
                    if (stored - record.value).abs() > VALUE_TOLERANCE {
                        return Err(IntegrityError::ConflictingDuplicate {
                            entity: entity.to_string(),
                            observed_at: record.observed_at.to_rfc3339(),
                            cadence_minutes: cadence.minutes(),
                            stored,
                            incoming: record.value,
                        }
                        .into());
                    }
                }
            }

            let mut inserted_here = 0;
            for record in group {
                if partition.contains_key(&record.observed_at) {
                    outcome.duplicates += 1;
                } else {
                    partition.insert(record.observed_at, record.value);
                    inserted_here += 1;
                    merged_spans.push(record);
                }
            }
            outcome.inserted += inserted_here;
            if inserted_here > 0 {
                outcome.entities.push(entity);
            }
        }

        outcome.span = MergeOutcome::span_of(&merged_spans);
        Ok(outcome)
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        range: &TimeRange,
    ) -> Result<Vec<IntervalRecord>> {
        let Some(partition) = self.partitions.get(&(entity.clone(), cadence)) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .range(range.start()..range.end())
            .map(|(&ts, &value)| IntervalRecord::new(entity.clone(), ts, value, cadence))
            .collect())
    }

    async fn count_day(&self, entity: &EntityId, cadence: Cadence, day: NaiveDate) -> Result<usize> {
        let range = TimeRange::day(day);
        let Some(partition) = self.partitions.get(&(entity.clone(), cadence)) else {
            return Ok(0);
        };
        Ok(partition.range(range.start()..range.end()).count())
    }

    async fn fetch_all(&self, entity: &EntityId, cadence: Cadence) -> Result<Vec<IntervalRecord>> {
        let Some(partition) = self.partitions.get(&(entity.clone(), cadence)) else {
            return Ok(Vec::new());
        };
        Ok(partition
            .iter()
            .map(|(&ts, &value)| IntervalRecord::new(entity.clone(), ts, value, cadence))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, m, 0).unwrap()
    }

    fn record(m: u32, value: f64) -> IntervalRecord {
        IntervalRecord::new("nsw1-wind", ts(m), value, Cadence::FIVE_MINUTE)
    }

    #[tokio::test]
    async fn merge_is_idempotent() {
        let store = MemoryRawStore::new();
        let records = vec![record(0, 1.0), record(5, 2.0)];

        let first = store.merge(records.clone()).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.duplicates, 0);

        let second = store.merge(records).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 2);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn conflicting_duplicate_is_fatal_and_writes_nothing() {
        let store = MemoryRawStore::new();
        store.merge(vec![record(0, 1.0)]).await.unwrap();

        let err = store
            .merge(vec![record(5, 3.0), record(0, 2.0)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Integrity(IntegrityError::ConflictingDuplicate { .. })
        ));
        // The batch containing the conflict must not have partially landed.
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn fetch_range_is_half_open() {
        let store = MemoryRawStore::new();
        store
            .merge(vec![record(0, 1.0), record(5, 2.0), record(10, 3.0)])
            .await
            .unwrap();

        let range = TimeRange::new(ts(0), ts(10)).unwrap();
        let records = store
            .fetch_range(&EntityId::new("nsw1-wind"), Cadence::FIVE_MINUTE, &range)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].value, 2.0);
    }

    #[tokio::test]
    async fn count_day_sees_only_that_day() {
        let store = MemoryRawStore::new();
        let next_day = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        store
            .merge(vec![
                record(0, 1.0),
                IntervalRecord::new("nsw1-wind", next_day, 4.0, Cadence::FIVE_MINUTE),
            ])
            .await
            .unwrap();

        let count = store
            .count_day(
                &EntityId::new("nsw1-wind"),
                Cadence::FIVE_MINUTE,
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn merge_reports_touched_span() {
        let store = MemoryRawStore::new();
        let outcome = store
            .merge(vec![record(0, 1.0), record(30, 2.0)])
            .await
            .unwrap();
        let span = outcome.span.unwrap();
        assert_eq!(span.start(), ts(0));
        assert_eq!(span.end(), ts(35));
    }
}
