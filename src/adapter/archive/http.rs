//! REST client for the interval archive.
//!
//! The archive exposes one day of raw records per source at
//! `GET {base_url}/sources/{source}/days/{YYYY-MM-DD}`. Responses are JSON
//! arrays of interval rows. Retry policy lives in the reconciler; this
//! client performs a single attempt per call.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ArchiveConfig;
use crate::domain::{Cadence, EntityId, IntervalRecord, SourceId};
use crate::error::{ArchiveError, Result};
use crate::port::ArchiveClient;

/// One record as serialized by the archive.
#[derive(Debug, Deserialize)]
struct ArchiveRow {
    entity_id: String,
    observed_at: DateTime<Utc>,
    value: f64,
    cadence_minutes: u32,
}

/// HTTP implementation of the archive port.
pub struct HttpArchive {
    http: HttpClient,
    base_url: String,
}

impl HttpArchive {
    /// Create a client against the given base URL.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            http: HttpClient::new(),
            base_url,
        }
    }

    #[must_use]
    pub fn from_config(config: &ArchiveConfig, request_timeout: Duration) -> Self {
        let http = HttpClient::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn day_url(&self, source: &SourceId, day: NaiveDate) -> String {
        format!(
            "{}/sources/{}/days/{}",
            self.base_url,
            source,
            day.format("%Y-%m-%d")
        )
    }

    fn into_records(rows: Vec<ArchiveRow>) -> Result<Vec<IntervalRecord>> {
        rows.into_iter()
            .map(|row| {
                let cadence = Cadence::from_minutes(row.cadence_minutes).map_err(|e| {
                    ArchiveError::Payload(format!(
                        "record for '{}' carries invalid cadence: {e}",
                        row.entity_id
                    ))
                })?;
                Ok(IntervalRecord::new(
                    EntityId::new(row.entity_id),
                    row.observed_at,
                    row.value,
                    cadence,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl ArchiveClient for HttpArchive {
    async fn fetch(&self, source: &SourceId, day: NaiveDate) -> Result<Vec<IntervalRecord>> {
        let url = self.day_url(source, day);
        debug!(%source, %day, url = %url.as_str(), "Fetching archive day");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(ArchiveError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status {
                source: source.to_string(),
                day,
                status: status.as_u16(),
            }
            .into());
        }

        let rows: Vec<ArchiveRow> = response.json().await.map_err(ArchiveError::Request)?;
        Self::into_records(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_url_is_date_formatted() {
        let archive = HttpArchive::new("https://archive.example.com/api".into());
        let url = archive.day_url(
            &SourceId::new("scada"),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        );
        assert_eq!(url, "https://archive.example.com/api/sources/scada/days/2024-03-01");
    }

    #[test]
    fn payload_with_bad_cadence_is_rejected() {
        let rows = vec![ArchiveRow {
            entity_id: "nsw1-wind".into(),
            observed_at: Utc::now(),
            value: 1.0,
            cadence_minutes: 7,
        }];
        assert!(HttpArchive::into_records(rows).is_err());
    }
}
