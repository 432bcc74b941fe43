//! Half-open UTC time ranges.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::Cadence;
use crate::error::ValidationError;

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, rejecting empty or inverted bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::EmptyRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// The calendar day `[midnight, next midnight)` in the store's
    /// reference clock (UTC).
    #[must_use]
    pub fn day(day: NaiveDate) -> Self {
        let start = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).expect("midnight is valid"));
        Self {
            start,
            end: start + chrono::Duration::days(1),
        }
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// True when `ts` falls inside `[start, end)`.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// True when the two half-open ranges share any instant.
    #[must_use]
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Smallest range covering both.
    #[must_use]
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Number of whole cadence intervals the range spans.
    #[must_use]
    pub fn interval_count(&self, cadence: Cadence) -> usize {
        let span = (self.end - self.start).num_seconds();
        (span / cadence.seconds()) as usize
    }

    /// Reject a range whose start does not sit on a cadence boundary
    /// (boundaries are aligned to the Unix epoch).
    pub fn check_aligned(&self, cadence: Cadence) -> Result<(), ValidationError> {
        let step = cadence.seconds();
        if self.start.timestamp() % step != 0 || self.end.timestamp() % step != 0 {
            return Err(ValidationError::UnalignedRange {
                start: self.start.to_rfc3339(),
                minutes: cadence.minutes(),
            });
        }
        Ok(())
    }

    /// Iterate the cadence-aligned bucket starts covering the range.
    pub fn bucket_starts(&self, cadence: Cadence) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        let step = cadence.duration();
        let mut next = self.start;
        let end = self.end;
        std::iter::from_fn(move || {
            if next >= end {
                return None;
            }
            let current = next;
            next += step;
            Some(current)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let day = TimeRange::day(date(2024, 3, 1));
        assert!(TimeRange::new(day.end(), day.start()).is_err());
    }

    #[test]
    fn day_range_counts_whole_intervals() {
        let day = TimeRange::day(date(2024, 3, 1));
        assert_eq!(day.interval_count(Cadence::FIVE_MINUTE), 288);
        assert_eq!(day.interval_count(Cadence::THIRTY_MINUTE), 48);
    }

    #[test]
    fn overlap_is_exclusive_of_shared_boundary() {
        let d1 = TimeRange::day(date(2024, 3, 1));
        let d2 = TimeRange::day(date(2024, 3, 2));
        assert!(!d1.overlaps(&d2));
        assert!(d1.overlaps(&d1.union(&d2)));
    }

    #[test]
    fn bucket_starts_cover_range() {
        let day = TimeRange::day(date(2024, 3, 1));
        let starts: Vec<_> = day.bucket_starts(Cadence::THIRTY_MINUTE).collect();
        assert_eq!(starts.len(), 48);
        assert_eq!(starts[0], day.start());
        assert_eq!(starts[1] - starts[0], Cadence::THIRTY_MINUTE.duration());
    }
}
