//! Archive collaborator port.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{IntervalRecord, SourceId};
use crate::error::Result;

/// External archive the reconciler pulls historically missing days from.
///
/// Implementations must be idempotent from the caller's perspective:
/// re-fetching a day that is already fully merged yields records that
/// dedupe to zero net change in the raw store.
#[async_trait]
pub trait ArchiveClient: Send + Sync {
    /// Fetch all raw records the archive holds for `source` on `day`.
    ///
    /// A short or empty response is not an error; the reconciler merges
    /// whatever arrives and leaves the day partial.
    async fn fetch(&self, source: &SourceId, day: NaiveDate) -> Result<Vec<IntervalRecord>>;
}
