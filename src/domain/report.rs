//! Per-day data-completeness reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Completeness classification of one entity/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCoverage {
    /// Actual count reached at least 99.9% of expected.
    Complete,
    /// Some records present, below the completeness threshold.
    Partial,
    /// No records at all.
    Missing,
}

/// Ratio of actual to expected records above which a day counts as
/// complete. Tolerates a stray dropped interval without flagging the day.
pub const COMPLETENESS_THRESHOLD: f64 = 0.999;

/// Audit result for one entity and calendar day.
///
/// Exported as-is to operational consumers; `expected_count` is derived
/// from the entity's declared native cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub entity_id: EntityId,
    pub day: NaiveDate,
    pub expected_count: usize,
    pub actual_count: usize,
    pub status: DayCoverage,
}

impl IntegrityReport {
    /// Classify a day from its expected and actual record counts.
    #[must_use]
    pub fn classify(
        entity_id: EntityId,
        day: NaiveDate,
        expected_count: usize,
        actual_count: usize,
    ) -> Self {
        let status = if actual_count == 0 {
            DayCoverage::Missing
        } else if (actual_count as f64) / (expected_count as f64) >= COMPLETENESS_THRESHOLD {
            DayCoverage::Complete
        } else {
            DayCoverage::Partial
        };
        Self {
            entity_id,
            day,
            expected_count,
            actual_count,
            status,
        }
    }
}
