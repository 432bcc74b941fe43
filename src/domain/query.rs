//! Query requests, cache keys and responses.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cadence, Coverage, EntityId, TimeRange};
use crate::error::ValidationError;

/// Smoothing method selection with its single parameter.
///
/// Parameters are validated eagerly; out-of-domain values are rejected,
/// never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SmoothingMethod {
    /// Exponentially weighted, strictly causal. `span` is the sample
    /// count the decay constant is derived from: alpha = 2 / (span + 1).
    Exponential { span: usize },
    /// Locally weighted regression over a tri-cube kernel. `fraction` of
    /// the series length defines each point's neighborhood.
    Loess { fraction: f64 },
}

impl SmoothingMethod {
    /// Reject parameters outside the method's domain.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            SmoothingMethod::Exponential { span } => {
                if span == 0 {
                    return Err(ValidationError::SpanOutOfRange { span: span as i64 });
                }
            }
            SmoothingMethod::Loess { fraction } => {
                if !fraction.is_finite() || fraction <= 0.0 || fraction > 1.0 {
                    return Err(ValidationError::FractionOutOfRange { fraction });
                }
            }
        }
        Ok(())
    }

    fn hash_discriminated<H: Hasher>(&self, state: &mut H) {
        match *self {
            SmoothingMethod::Exponential { span } => {
                0u8.hash(state);
                span.hash(state);
            }
            SmoothingMethod::Loess { fraction } => {
                1u8.hash(state);
                fraction.to_bits().hash(state);
            }
        }
    }

    fn eq_bits(&self, other: &Self) -> bool {
        match (*self, *other) {
            (
                SmoothingMethod::Exponential { span: a },
                SmoothingMethod::Exponential { span: b },
            ) => a == b,
            (SmoothingMethod::Loess { fraction: a }, SmoothingMethod::Loess { fraction: b }) => {
                a.to_bits() == b.to_bits()
            }
            _ => false,
        }
    }
}

/// A fully validated analytical query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Entities whose unified series are summed into the aggregate.
    pub entities: Vec<EntityId>,
    pub range: TimeRange,
    pub target_cadence: Cadence,
    pub method: SmoothingMethod,
    /// 365 or 366; the leap-year choice belongs to the caller.
    pub reference_year_days: u32,
    /// Divisor applied after the annualisation product, e.g. 1e6 for
    /// MW to TWh.
    pub unit_scale: f64,
}

impl QueryRequest {
    /// Validate the request's own parameters (entity existence is checked
    /// against the registry by the query service).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.entities.is_empty() {
            return Err(ValidationError::EmptyEntitySet);
        }
        self.range.check_aligned(self.target_cadence)?;
        self.method.validate()?;
        if self.reference_year_days != 365 && self.reference_year_days != 366 {
            return Err(ValidationError::ReferenceYearOutOfRange(
                self.reference_year_days,
            ));
        }
        if !self.unit_scale.is_finite() || self.unit_scale <= 0.0 {
            return Err(ValidationError::UnitScaleOutOfRange(self.unit_scale));
        }
        Ok(())
    }

    /// Derive the cache key. Entities are sorted and deduplicated so
    /// logically identical requests share a key.
    #[must_use]
    pub fn key(&self) -> QueryKey {
        let mut entities = self.entities.clone();
        entities.sort();
        entities.dedup();
        QueryKey {
            entities,
            range: self.range,
            target_cadence: self.target_cadence,
            method: self.method,
            reference_year_days: self.reference_year_days,
            unit_scale: self.unit_scale,
        }
    }
}

/// The tuple of parameters that fully determines a cacheable result.
///
/// Float parameters participate via their exact bit patterns so two keys
/// are equal exactly when every computation input is equal.
#[derive(Debug, Clone)]
pub struct QueryKey {
    pub entities: Vec<EntityId>,
    pub range: TimeRange,
    pub target_cadence: Cadence,
    pub method: SmoothingMethod,
    pub reference_year_days: u32,
    pub unit_scale: f64,
}

impl PartialEq for QueryKey {
    fn eq(&self, other: &Self) -> bool {
        self.entities == other.entities
            && self.range == other.range
            && self.target_cadence == other.target_cadence
            && self.method.eq_bits(&other.method)
            && self.reference_year_days == other.reference_year_days
            && self.unit_scale.to_bits() == other.unit_scale.to_bits()
    }
}

impl Eq for QueryKey {}

impl Hash for QueryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.entities.hash(state);
        self.range.hash(state);
        self.target_cadence.hash(state);
        self.method.hash_discriminated(state);
        self.reference_year_days.hash(state);
        self.unit_scale.to_bits().hash(state);
    }
}

/// How the aggregation cache satisfied a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from an existing entry.
    Hit,
    /// This call ran the computation.
    Miss,
    /// Another identical call was already computing; this one awaited it.
    InFlightJoined,
}

/// Final pipeline output handed to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Ordered (timestamp, implied annual energy) sequence; `None` marks
    /// intervals with no underlying data.
    pub points: Vec<(DateTime<Utc>, Option<f64>)>,
    /// Distinguishes complete data from partial coverage so consumers
    /// never mistake a gap for a true zero.
    pub coverage_status: Coverage,
    pub cache_status: CacheStatus,
}
