//! Eager-strategy store: resident reads over a durable write-through.
//!
//! Wraps the on-disk store, materializing the full dataset in memory at
//! construction. Merges write through to disk first, then update the
//! resident copy; every read is served from memory.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{MemoryRawStore, SqliteRawStore};
use crate::domain::{Cadence, EntityId, EntityRegistry, IntervalRecord, TimeRange};
use crate::error::Result;
use crate::port::{MergeOutcome, RawStore};

/// Resident store backing the eager deployment strategy.
pub struct ResidentRawStore {
    disk: SqliteRawStore,
    memory: MemoryRawStore,
}

impl ResidentRawStore {
    /// Materialize every declared entity's records from disk.
    pub async fn load(disk: SqliteRawStore, registry: &EntityRegistry) -> Result<Self> {
        let memory = MemoryRawStore::new();
        for spec in registry.iter() {
            let records = disk.fetch_all(&spec.entity_id, spec.cadence).await?;
            if !records.is_empty() {
                memory.merge(records).await?;
            }
        }
        Ok(Self { disk, memory })
    }

    /// Records currently resident in memory.
    #[must_use]
    pub fn resident_len(&self) -> usize {
        self.memory.len()
    }
}

#[async_trait]
impl RawStore for ResidentRawStore {
    async fn merge(&self, records: Vec<IntervalRecord>) -> Result<MergeOutcome> {
        // Disk is authoritative; only after it accepts the batch does the
        // resident copy pick it up.
        let outcome = self.disk.merge(records.clone()).await?;
        self.memory.merge(records).await?;
        Ok(outcome)
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        range: &TimeRange,
    ) -> Result<Vec<IntervalRecord>> {
        self.memory.fetch_range(entity, cadence, range).await
    }

    async fn count_day(&self, entity: &EntityId, cadence: Cadence, day: NaiveDate) -> Result<usize> {
        self.memory.count_day(entity, cadence, day).await
    }

    async fn fetch_all(&self, entity: &EntityId, cadence: Cadence) -> Result<Vec<IntervalRecord>> {
        self.memory.fetch_all(entity, cadence).await
    }
}
