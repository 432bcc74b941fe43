//! Cadence unification: bucket-mean resampling and cross-entity sums.

use crate::domain::{CanonicalSeries, Cadence, IntervalRecord, SeriesPoint, TimeRange};
use crate::error::{Result, ValidationError};

/// Downsample one native-cadence record set onto the target grid.
///
/// Buckets are half-open `[start, start + target)` intervals aligned to
/// the Unix epoch. Each bucket's value is the arithmetic mean of the
/// samples that actually landed in it; a partially populated bucket
/// averages what is present instead of dividing by an assumed count, and
/// an empty bucket is an explicit gap, never zero.
pub fn resample(
    records: &[IntervalRecord],
    native: Cadence,
    target: Cadence,
    range: &TimeRange,
) -> Result<CanonicalSeries> {
    if !native.divides(target) {
        return Err(ValidationError::CadenceMismatch {
            native_minutes: native.minutes(),
            target_minutes: target.minutes(),
        }
        .into());
    }
    range.check_aligned(target)?;

    let step = target.seconds();
    let base = range.start().timestamp();
    let bucket_count = range.interval_count(target);

    let mut sums = vec![0.0f64; bucket_count];
    let mut counts = vec![0usize; bucket_count];

    for record in records {
        if !range.contains(record.observed_at) {
            continue;
        }
        let index = ((record.observed_at.timestamp() - base) / step) as usize;
        sums[index] += record.value;
        counts[index] += 1;
    }

    let points = range
        .bucket_starts(target)
        .enumerate()
        .map(|(i, ts)| {
            if counts[i] == 0 {
                SeriesPoint::missing(ts)
            } else {
                SeriesPoint::present(ts, sums[i] / counts[i] as f64)
            }
        })
        .collect();

    Ok(CanonicalSeries::new(target, points)?)
}

/// Sum already-unified series element-wise into one aggregate.
///
/// Inputs must share cadence, length and timestamps — i.e. each entity
/// has been normalized first; raw mixed-cadence samples are never summed
/// directly. A bucket where some entities are missing sums the present
/// ones; a bucket missing everywhere stays missing.
pub fn combine(series_set: &[CanonicalSeries]) -> Result<CanonicalSeries> {
    let Some(first) = series_set.first() else {
        return Err(ValidationError::EmptyEntitySet.into());
    };

    for series in &series_set[1..] {
        if series.cadence() != first.cadence() {
            return Err(ValidationError::SeriesCadenceMismatch {
                left: first.cadence().minutes(),
                right: series.cadence().minutes(),
            }
            .into());
        }
        if series.len() != first.len() {
            return Err(ValidationError::SeriesLengthMismatch {
                left: first.len(),
                right: series.len(),
            }
            .into());
        }
    }

    let values: Vec<Option<f64>> = (0..first.len())
        .map(|i| {
            let mut sum = None;
            for series in series_set {
                if let Some(value) = series.points()[i].value {
                    *sum.get_or_insert(0.0) += value;
                }
            }
            sum
        })
        .collect();

    Ok(first.with_values(values))
}

/// Unify a set of per-entity native series into one aggregate canonical
/// series at the target cadence: per-entity resampling first, then the
/// cross-entity sum.
pub fn unify(
    series_set: &[(Cadence, Vec<IntervalRecord>)],
    target: Cadence,
    range: &TimeRange,
) -> Result<CanonicalSeries> {
    if series_set.is_empty() {
        return Err(ValidationError::EmptyEntitySet.into());
    }

    let resampled: Vec<CanonicalSeries> = series_set
        .iter()
        .map(|(native, records)| resample(records, *native, target, range))
        .collect::<Result<_>>()?;

    combine(&resampled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn hour_range() -> TimeRange {
        TimeRange::new(ts(0, 0), ts(1, 0)).unwrap()
    }

    fn five_min_records(values: &[(u32, f64)]) -> Vec<IntervalRecord> {
        values
            .iter()
            .map(|&(m, v)| {
                IntervalRecord::new("nsw1-wind", ts(m / 60, m % 60), v, Cadence::FIVE_MINUTE)
            })
            .collect()
    }

    #[test]
    fn bucket_mean_over_six_five_minute_samples() {
        let records = five_min_records(&[
            (0, 10.0),
            (5, 20.0),
            (10, 30.0),
            (15, 40.0),
            (20, 50.0),
            (25, 60.0),
        ]);
        let series =
            resample(&records, Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &hour_range())
                .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].value, Some(35.0));
        assert_eq!(series.points()[1].value, None);
    }

    #[test]
    fn partial_bucket_averages_present_samples_only() {
        // Two of six samples present: the mean divides by 2, not 6.
        let records = five_min_records(&[(0, 10.0), (25, 30.0)]);
        let series =
            resample(&records, Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &hour_range())
                .unwrap();

        assert_eq!(series.points()[0].value, Some(20.0));
    }

    #[test]
    fn mean_is_invariant_to_samples_outside_the_bucket() {
        let inside = five_min_records(&[(0, 10.0), (5, 30.0)]);
        let mut with_outside = inside.clone();
        with_outside.extend(five_min_records(&[(45, 999.0)]));

        let a = resample(&inside, Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &hour_range())
            .unwrap();
        let b = resample(
            &with_outside,
            Cadence::FIVE_MINUTE,
            Cadence::THIRTY_MINUTE,
            &hour_range(),
        )
        .unwrap();

        assert_eq!(a.points()[0], b.points()[0]);
    }

    #[test]
    fn empty_bucket_is_missing_not_zero() {
        let series = resample(&[], Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &hour_range())
            .unwrap();
        assert!(series.points().iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn finer_target_than_native_is_rejected() {
        let err = resample(&[], Cadence::THIRTY_MINUTE, Cadence::FIVE_MINUTE, &hour_range());
        assert!(err.is_err());
    }

    #[test]
    fn combine_sums_present_entities_per_bucket() {
        let range = hour_range();
        let wind = resample(
            &five_min_records(&[(0, 10.0)]),
            Cadence::FIVE_MINUTE,
            Cadence::THIRTY_MINUTE,
            &range,
        )
        .unwrap();
        let solar = resample(
            &five_min_records(&[(0, 5.0), (30, 7.0)]),
            Cadence::FIVE_MINUTE,
            Cadence::THIRTY_MINUTE,
            &range,
        )
        .unwrap();

        let total = combine(&[wind, solar]).unwrap();
        assert_eq!(total.points()[0].value, Some(15.0));
        // Only solar reported in the second bucket.
        assert_eq!(total.points()[1].value, Some(7.0));
    }

    #[test]
    fn combine_keeps_fully_absent_buckets_missing() {
        let range = hour_range();
        let a = resample(&[], Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &range).unwrap();
        let b = resample(&[], Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &range).unwrap();

        let total = combine(&[a, b]).unwrap();
        assert!(total.points().iter().all(|p| p.value.is_none()));
    }

    #[test]
    fn unify_mixed_cadences_normalizes_before_summing() {
        let range = hour_range();
        let fine = five_min_records(&[(0, 10.0), (5, 20.0)]);
        let coarse = vec![IntervalRecord::new(
            "nsw1-price",
            ts(0, 0),
            100.0,
            Cadence::THIRTY_MINUTE,
        )];

        let total = unify(
            &[
                (Cadence::FIVE_MINUTE, fine),
                (Cadence::THIRTY_MINUTE, coarse),
            ],
            Cadence::THIRTY_MINUTE,
            &range,
        )
        .unwrap();

        // 5-minute entity averages to 15, coarse entity contributes 100.
        assert_eq!(total.points()[0].value, Some(115.0));
    }

    #[test]
    fn whole_day_resample_keeps_288_to_48_shape() {
        let day = TimeRange::day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let records: Vec<_> = day
            .bucket_starts(Cadence::FIVE_MINUTE)
            .map(|ts| IntervalRecord::new("nsw1-wind", ts, 50.0, Cadence::FIVE_MINUTE))
            .collect();
        assert_eq!(records.len(), 288);

        let series = resample(&records, Cadence::FIVE_MINUTE, Cadence::THIRTY_MINUTE, &day).unwrap();
        assert_eq!(series.len(), 48);
        assert!(series.points().iter().all(|p| p.value == Some(50.0)));
    }
}
