//! Raw interval telemetry records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Cadence, EntityId};

/// One observed interval value as ingested or backfilled.
///
/// Records are append-only: the raw store never holds two records with the
/// same `(entity_id, observed_at, cadence)` key, and corrections arrive as
/// new records superseding by key during merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub entity_id: EntityId,
    pub observed_at: DateTime<Utc>,
    /// Rate (MW) or price for the interval ending here.
    pub value: f64,
    pub cadence: Cadence,
}

impl IntervalRecord {
    pub fn new(
        entity_id: impl Into<EntityId>,
        observed_at: DateTime<Utc>,
        value: f64,
        cadence: Cadence,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            observed_at,
            value,
            cadence,
        }
    }

    /// Unique key within the raw store.
    #[must_use]
    pub fn key(&self) -> (EntityId, DateTime<Utc>, Cadence) {
        (self.entity_id.clone(), self.observed_at, self.cadence)
    }

    /// Calendar day the observation belongs to (UTC).
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.observed_at.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_day_is_utc_calendar_day() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 23, 55, 0).unwrap();
        let record = IntervalRecord::new("vic1-solar", ts, 120.5, Cadence::FIVE_MINUTE);
        assert_eq!(
            record.day(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
