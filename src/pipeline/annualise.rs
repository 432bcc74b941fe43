//! Implied annual energy from smoothed power.

use crate::domain::{EnergySeries, SeriesPoint, SmoothedSeries};
use crate::error::{Result, ValidationError};

/// Convert a smoothed power series into implied annual energy:
/// `energy = power * 24 * reference_year_days / unit_scale`.
///
/// Both factors are explicit because the leap-year choice (365 vs 366)
/// and the unit factor (e.g. 1e6 for MW to TWh) belong to the caller.
/// The input type is only produced by the smoothing engine, so energy is
/// always computed downstream of smoothing, never from raw or merely
/// unified power.
pub fn annualise(
    series: &SmoothedSeries,
    reference_year_days: u32,
    unit_scale: f64,
) -> Result<EnergySeries> {
    if reference_year_days != 365 && reference_year_days != 366 {
        return Err(ValidationError::ReferenceYearOutOfRange(reference_year_days).into());
    }
    if !unit_scale.is_finite() || unit_scale <= 0.0 {
        return Err(ValidationError::UnitScaleOutOfRange(unit_scale).into());
    }

    let factor = 24.0 * f64::from(reference_year_days) / unit_scale;
    let inner = series.as_series();
    let points = inner
        .points()
        .iter()
        .map(|p| SeriesPoint {
            timestamp: p.timestamp,
            value: p.value.map(|power| power * factor),
        })
        .collect();

    Ok(EnergySeries::new(inner.cadence(), points))
}
