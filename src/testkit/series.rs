//! Builders for interval records and synthetic telemetry days.

use chrono::NaiveDate;

use crate::domain::{Cadence, EntityId, IntervalRecord, TimeRange};

/// A fully populated day of records at the given cadence, with values
/// produced per interval index.
pub fn day_records(
    entity: impl Into<EntityId>,
    day: NaiveDate,
    cadence: Cadence,
    mut value: impl FnMut(usize) -> f64,
) -> Vec<IntervalRecord> {
    let entity = entity.into();
    TimeRange::day(day)
        .bucket_starts(cadence)
        .enumerate()
        .map(|(i, ts)| IntervalRecord::new(entity.clone(), ts, value(i), cadence))
        .collect()
}

/// A fully populated constant-valued day.
pub fn constant_day(
    entity: impl Into<EntityId>,
    day: NaiveDate,
    cadence: Cadence,
    value: f64,
) -> Vec<IntervalRecord> {
    day_records(entity, day, cadence, |_| value)
}
