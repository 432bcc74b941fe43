//! Native and target sampling cadences.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Fixed interval between successive samples of a series, in minutes.
///
/// Only cadences that divide a day evenly are representable, so a full
/// day always contains a whole number of intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Cadence(u32);

impl Cadence {
    /// Five-minute dispatch cadence.
    pub const FIVE_MINUTE: Cadence = Cadence(5);

    /// Thirty-minute trading cadence.
    pub const THIRTY_MINUTE: Cadence = Cadence(30);

    /// Create a cadence from a minute count.
    ///
    /// # Errors
    /// Returns a validation error if the cadence is zero or does not
    /// divide a day evenly.
    pub fn from_minutes(minutes: u32) -> Result<Self, ValidationError> {
        if minutes == 0 || MINUTES_PER_DAY % minutes != 0 {
            return Err(ValidationError::CadenceNotDivisor { minutes });
        }
        Ok(Self(minutes))
    }

    /// Cadence length in minutes.
    #[must_use]
    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Cadence length in seconds.
    #[must_use]
    pub fn seconds(&self) -> i64 {
        i64::from(self.0) * 60
    }

    /// Number of samples a fully populated day contains at this cadence.
    #[must_use]
    pub fn expected_per_day(&self) -> usize {
        (MINUTES_PER_DAY / self.0) as usize
    }

    /// Cadence as a chrono duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }

    /// True when `self` can be aggregated into `target` with a whole
    /// number of samples per bucket.
    #[must_use]
    pub fn divides(&self, target: Cadence) -> bool {
        self.0 <= target.0 && target.0 % self.0 == 0
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

impl TryFrom<u32> for Cadence {
    type Error = ValidationError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl From<Cadence> for u32 {
    fn from(cadence: Cadence) -> Self {
        cadence.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_minute_day_has_288_samples() {
        assert_eq!(Cadence::FIVE_MINUTE.expected_per_day(), 288);
    }

    #[test]
    fn thirty_minute_day_has_48_samples() {
        assert_eq!(Cadence::THIRTY_MINUTE.expected_per_day(), 48);
    }

    #[test]
    fn rejects_cadence_that_does_not_divide_a_day()  {
        assert!(Cadence::from_minutes(7).is_err());
        assert!(Cadence::from_minutes(0).is_err());
    }

    #[test]
    fn divides_requires_whole_buckets() {
        assert!(Cadence::FIVE_MINUTE.divides(Cadence::THIRTY_MINUTE));
        assert!(Cadence::THIRTY_MINUTE.divides(Cadence::THIRTY_MINUTE));
        assert!(!Cadence::THIRTY_MINUTE.divides(Cadence::FIVE_MINUTE));
        let twenty = Cadence::from_minutes(20).unwrap();
        assert!(!twenty.divides(Cadence::THIRTY_MINUTE));
    }
}
