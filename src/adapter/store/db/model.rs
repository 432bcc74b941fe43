//! Database model types for Diesel ORM.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;

use super::schema::interval_records;
use crate::domain::{Cadence, EntityId, IntervalRecord};
use crate::error::{Error, Result};

/// Database row for an interval record.
///
/// Timestamps are stored as fixed-width UTC RFC 3339 text
/// (`2024-03-01T00:05:00Z`) so lexicographic comparison matches
/// chronological order in range filters.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = interval_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct IntervalRow {
    pub entity_id: String,
    pub observed_at: String,
    pub cadence_minutes: i32,
    pub value: f64,
}

/// Serialize a timestamp into the stored text form.
#[must_use]
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored text timestamp.
pub fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| Error::Parse(format!("bad stored timestamp '{raw}': {e}")))
}

impl IntervalRow {
    pub fn from_record(record: &IntervalRecord) -> Self {
        Self {
            entity_id: record.entity_id.to_string(),
            observed_at: fmt_ts(record.observed_at),
            cadence_minutes: record.cadence.minutes() as i32,
            value: record.value,
        }
    }

    pub fn into_record(self) -> Result<IntervalRecord> {
        let cadence = Cadence::from_minutes(self.cadence_minutes as u32)
            .map_err(|e| Error::Parse(e.to_string()))?;
        Ok(IntervalRecord::new(
            EntityId::new(self.entity_id),
            parse_ts(&self.observed_at)?,
            self.value,
            cadence,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn timestamp_text_sorts_chronologically() {
        let earlier = fmt_ts(Utc.with_ymd_and_hms(2024, 3, 1, 9, 55, 0).unwrap());
        let later = fmt_ts(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert!(earlier < later);
        assert_eq!(earlier, "2024-03-01T09:55:00Z");
    }

    #[test]
    fn row_roundtrips_to_record() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 5, 0).unwrap();
        let record = IntervalRecord::new("vic1-solar", ts, 88.25, Cadence::FIVE_MINUTE);
        let row = IntervalRow::from_record(&record);
        let back = row.into_record().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn rejects_malformed_stored_timestamp() {
        assert!(parse_ts("yesterday").is_err());
    }
}
