//! Scripted archive double for reconciliation tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;

use crate::domain::{IntervalRecord, SourceId};
use crate::error::{ArchiveError, Result};
use crate::port::ArchiveClient;

/// One scripted reply for a (source, day) unit.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    /// Deliver these records.
    Records(Vec<IntervalRecord>),
    /// Fail the fetch with a transient-looking archive error.
    Failure(String),
}

/// Archive double that replays scripted responses per (source, day).
///
/// Responses queue in script order; the final response is sticky so
/// repeated fetches (idempotence tests) keep receiving it. Unscripted
/// days fail like a 404 from the real archive.
#[derive(Debug, Default)]
pub struct ScriptedArchive {
    scripts: Mutex<HashMap<(SourceId, NaiveDate), VecDeque<ScriptedResponse>>>,
    calls: AtomicUsize,
}

impl ScriptedArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response for the day.
    pub fn script_records(
        &self,
        source: &SourceId,
        day: NaiveDate,
        records: Vec<IntervalRecord>,
    ) -> &Self {
        self.push(source, day, ScriptedResponse::Records(records));
        self
    }

    /// Queue a transient failure for the day.
    pub fn script_failure(&self, source: &SourceId, day: NaiveDate, reason: &str) -> &Self {
        self.push(source, day, ScriptedResponse::Failure(reason.to_string()));
        self
    }

    /// Total fetch calls observed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn push(&self, source: &SourceId, day: NaiveDate, response: ScriptedResponse) {
        self.scripts
            .lock()
            .entry((source.clone(), day))
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl ArchiveClient for ScriptedArchive {
    async fn fetch(&self, source: &SourceId, day: NaiveDate) -> Result<Vec<IntervalRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let response = {
            let mut scripts = self.scripts.lock();
            match scripts.get_mut(&(source.clone(), day)) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match response {
            Some(ScriptedResponse::Records(records)) => Ok(records),
            Some(ScriptedResponse::Failure(reason)) => {
                Err(ArchiveError::Payload(reason).into())
            }
            None => Err(ArchiveError::Status {
                source: source.to_string(),
                day,
                status: 404,
            }
            .into()),
        }
    }
}
