//! Gap-explicit canonical series and its derived forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cadence, TimeRange};
use crate::error::ValidationError;

/// One sample of a canonical series. A `None` value is an explicit gap
/// marker, never a zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
}

impl SeriesPoint {
    #[must_use]
    pub fn present(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value: Some(value),
        }
    }

    #[must_use]
    pub fn missing(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            value: None,
        }
    }
}

/// Data completeness of a derived series or query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    /// Every interval in the covered range carries a value.
    Complete,
    /// At least one interval is an explicit gap.
    Partial,
}

/// A duplicate-free, single-cadence power (or price) series for one
/// entity set, with strictly increasing timestamps and explicit gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalSeries {
    cadence: Cadence,
    points: Vec<SeriesPoint>,
}

impl CanonicalSeries {
    /// Build a series, rejecting non-increasing timestamps.
    pub fn new(cadence: Cadence, points: Vec<SeriesPoint>) -> Result<Self, ValidationError> {
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ValidationError::NonMonotonicSeries {
                    previous: pair[0].timestamp.to_rfc3339(),
                    current: pair[1].timestamp.to_rfc3339(),
                });
            }
        }
        Ok(Self { cadence, points })
    }

    /// An all-missing series spanning `range` at `cadence`.
    #[must_use]
    pub fn empty(cadence: Cadence, range: &TimeRange) -> Self {
        let points = range
            .bucket_starts(cadence)
            .map(SeriesPoint::missing)
            .collect();
        Self { cadence, points }
    }

    #[must_use]
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Complete when no point is a gap marker.
    #[must_use]
    pub fn coverage(&self) -> Coverage {
        if self.points.iter().any(|p| p.value.is_none()) {
            Coverage::Partial
        } else {
            Coverage::Complete
        }
    }

    /// Replace the value column wholesale. Callers must supply one value
    /// per existing point.
    pub(crate) fn with_values(&self, values: Vec<Option<f64>>) -> CanonicalSeries {
        debug_assert_eq!(values.len(), self.points.len());
        CanonicalSeries {
            cadence: self.cadence,
            points: self
                .points
                .iter()
                .zip(values)
                .map(|(p, value)| SeriesPoint {
                    timestamp: p.timestamp,
                    value,
                })
                .collect(),
        }
    }
}

/// A canonical power series that has passed through the smoothing engine.
///
/// This is the only input the annualisation calculator accepts, which
/// pins the smooth-then-annualise ordering at the type level.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSeries(CanonicalSeries);

impl SmoothedSeries {
    /// Only the smoothing engine constructs this.
    pub(crate) fn new(series: CanonicalSeries) -> Self {
        Self(series)
    }

    #[must_use]
    pub fn as_series(&self) -> &CanonicalSeries {
        &self.0
    }
}

/// Implied annual energy series produced by the annualisation calculator.
///
/// Deliberately not convertible back into a `CanonicalSeries`, so smoothed
/// energy values can never re-enter the smoothing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergySeries {
    cadence: Cadence,
    points: Vec<SeriesPoint>,
}

impl EnergySeries {
    pub(crate) fn new(cadence: Cadence, points: Vec<SeriesPoint>) -> Self {
        Self { cadence, points }
    }

    #[must_use]
    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[must_use]
    pub fn coverage(&self) -> Coverage {
        if self.points.iter().any(|p| p.value.is_none()) {
            Coverage::Partial
        } else {
            Coverage::Complete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    #[test]
    fn rejects_duplicate_timestamps() {
        let points = vec![
            SeriesPoint::present(ts(0, 0), 1.0),
            SeriesPoint::present(ts(0, 0), 2.0),
        ];
        assert!(CanonicalSeries::new(Cadence::FIVE_MINUTE, points).is_err());
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let points = vec![
            SeriesPoint::present(ts(0, 5), 1.0),
            SeriesPoint::present(ts(0, 0), 2.0),
        ];
        assert!(CanonicalSeries::new(Cadence::FIVE_MINUTE, points).is_err());
    }

    #[test]
    fn gap_marks_series_partial() {
        let points = vec![
            SeriesPoint::present(ts(0, 0), 1.0),
            SeriesPoint::missing(ts(0, 5)),
        ];
        let series = CanonicalSeries::new(Cadence::FIVE_MINUTE, points).unwrap();
        assert_eq!(series.coverage(), Coverage::Partial);
    }

    #[test]
    fn empty_series_spans_range_with_gaps() {
        let day = TimeRange::day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let series = CanonicalSeries::empty(Cadence::THIRTY_MINUTE, &day);
        assert_eq!(series.len(), 48);
        assert_eq!(series.coverage(), Coverage::Partial);
    }
}
