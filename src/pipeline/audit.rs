//! Per-day coverage auditing of the raw store.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{EntityId, EntityRegistry, IntegrityReport, SourceId};
use crate::error::Result;
use crate::port::RawStore;

/// Compares actual against expected record counts per entity/day.
///
/// Pure reader: auditing never mutates the store. Used standalone for
/// operational reporting and internally to drive reconciliation.
pub struct IntegrityAuditor<S: RawStore + ?Sized> {
    store: Arc<S>,
    registry: EntityRegistry,
}

impl<S: RawStore + ?Sized> IntegrityAuditor<S> {
    pub fn new(store: Arc<S>, registry: EntityRegistry) -> Self {
        Self { store, registry }
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Audit one entity for one UTC calendar day.
    pub async fn audit(&self, entity: &EntityId, day: NaiveDate) -> Result<IntegrityReport> {
        let spec = self.registry.resolve(entity)?;
        let expected = spec.cadence.expected_per_day();
        let actual = self.store.count_day(entity, spec.cadence, day).await?;
        Ok(IntegrityReport::classify(
            entity.clone(),
            day,
            expected,
            actual,
        ))
    }

    /// Audit one entity across an inclusive day range.
    pub async fn audit_days(
        &self,
        entity: &EntityId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<IntegrityReport>> {
        let mut reports = Vec::new();
        for day in day_range(from, to) {
            reports.push(self.audit(entity, day).await?);
        }
        Ok(reports)
    }

    /// Audit every entity fed by `source` across an inclusive day range.
    pub async fn audit_source(
        &self,
        source: &SourceId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<IntegrityReport>> {
        let mut reports = Vec::new();
        for spec in self.registry.entities_for_source(source) {
            let entity = spec.entity_id.clone();
            reports.extend(self.audit_days(&entity, from, to).await?);
        }
        Ok(reports)
    }
}

/// Inclusive sequence of calendar days.
pub fn day_range(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let mut current = Some(from);
    std::iter::from_fn(move || {
        let day = current?;
        if day > to {
            return None;
        }
        current = day.succ_opt();
        Some(day)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::store::MemoryRawStore;
    use crate::domain::{Cadence, DayCoverage, EntitySpec, IntervalRecord, TelemetryKind, TimeRange};
    use crate::port::RawStore as _;

    fn registry() -> EntityRegistry {
        EntityRegistry::new([EntitySpec {
            entity_id: EntityId::new("nsw1-wind"),
            source: SourceId::new("scada"),
            kind: TelemetryKind::Generation,
            cadence: Cadence::FIVE_MINUTE,
        }])
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    async fn populate(store: &MemoryRawStore, day: NaiveDate, count: usize) {
        let range = TimeRange::day(day);
        let records: Vec<_> = range
            .bucket_starts(Cadence::FIVE_MINUTE)
            .take(count)
            .map(|ts| IntervalRecord::new("nsw1-wind", ts, 100.0, Cadence::FIVE_MINUTE))
            .collect();
        store.merge(records).await.unwrap();
    }

    #[tokio::test]
    async fn full_day_is_complete_with_expected_288() {
        let store = Arc::new(MemoryRawStore::new());
        populate(&store, day(), 288).await;
        let auditor = IntegrityAuditor::new(Arc::clone(&store), registry());

        let report = auditor.audit(&EntityId::new("nsw1-wind"), day()).await.unwrap();
        assert_eq!(report.expected_count, 288);
        assert_eq!(report.actual_count, 288);
        assert_eq!(report.status, DayCoverage::Complete);
    }

    #[tokio::test]
    async fn sparse_day_is_partial() {
        let store = Arc::new(MemoryRawStore::new());
        populate(&store, day(), 100).await;
        let auditor = IntegrityAuditor::new(Arc::clone(&store), registry());

        let report = auditor.audit(&EntityId::new("nsw1-wind"), day()).await.unwrap();
        assert_eq!(report.status, DayCoverage::Partial);
    }

    #[tokio::test]
    async fn absent_day_is_missing() {
        let store = Arc::new(MemoryRawStore::new());
        let auditor = IntegrityAuditor::new(store, registry());

        let report = auditor.audit(&EntityId::new("nsw1-wind"), day()).await.unwrap();
        assert_eq!(report.actual_count, 0);
        assert_eq!(report.status, DayCoverage::Missing);
    }

    #[tokio::test]
    async fn unknown_entity_is_a_validation_error() {
        let store = Arc::new(MemoryRawStore::new());
        let auditor = IntegrityAuditor::new(store, registry());

        assert!(auditor.audit(&EntityId::new("tas1-hydro"), day()).await.is_err());
    }

    #[test]
    fn day_range_is_inclusive() {
        let days: Vec<_> = day_range(day(), day().succ_opt().unwrap()).collect();
        assert_eq!(days.len(), 2);
    }
}
