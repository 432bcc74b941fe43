//! SQLite raw store implementation using Diesel.
//!
//! Backs the lazy deployment strategy: queries read only the requested
//! slice from disk. A per-entity async mutex keeps the single-writer-per-
//! entity discipline while merges for distinct entities run concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use diesel::prelude::*;
use tokio::sync::Mutex;

use super::db::model::{fmt_ts, IntervalRow};
use super::db::schema::interval_records;
use super::db::DbPool;
use super::VALUE_TOLERANCE;
use crate::domain::{Cadence, EntityId, IntervalRecord, TimeRange};
use crate::error::{Error, IntegrityError, Result};
use crate::port::{MergeOutcome, RawStore};

/// SQLite-backed raw store.
pub struct SqliteRawStore {
    pool: DbPool,
    write_locks: DashMap<EntityId, Arc<Mutex<()>>>,
}

impl SqliteRawStore {
    /// Create a new SQLite raw store over an existing pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            write_locks: DashMap::new(),
        }
    }

    fn entity_lock(&self, entity: &EntityId) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(entity.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Merge one entity's group of records under its write lock.
    async fn merge_entity_group(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        group: Vec<IntervalRecord>,
    ) -> Result<(usize, usize, Vec<IntervalRecord>)> {
        let lock = self.entity_lock(entity);
        let _guard = lock.lock().await;

        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let span = MergeOutcome::span_of(&group).expect("non-empty group has a span");
        let existing: Vec<IntervalRow> = interval_records::table
            .filter(interval_records::entity_id.eq(entity.as_str()))
            .filter(interval_records::cadence_minutes.eq(cadence.minutes() as i32))
            .filter(interval_records::observed_at.ge(fmt_ts(span.start())))
            .filter(interval_records::observed_at.lt(fmt_ts(span.end())))
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        let stored: std::collections::HashMap<String, f64> = existing
            .into_iter()
            .map(|row| (row.observed_at, row.value))
            .collect();

        // Conflict scan first so a conflicting batch writes nothing for
        // this entity.
        for record in &group {
            if let Some(&value) = stored.get(&fmt_ts(record.observed_at)) {
                if (value - record.value).abs() > VALUE_TOLERANCE {
                    return Err(IntegrityError::ConflictingDuplicate {
                        entity: entity.to_string(),
                        observed_at: record.observed_at.to_rfc3339(),
                        cadence_minutes: cadence.minutes(),
                        stored: value,
                        incoming: record.value,
                    }
                    .into());
                }
            }
        }

        let mut net_new = Vec::new();
        let mut duplicates = 0;
        for record in group {
            if stored.contains_key(&fmt_ts(record.observed_at)) {
                duplicates += 1;
            } else {
                net_new.push(record);
            }
        }

        if !net_new.is_empty() {
            let rows: Vec<IntervalRow> = net_new.iter().map(IntervalRow::from_record).collect();
            diesel::insert_into(interval_records::table)
                .values(&rows)
                .execute(&mut conn)
                .map_err(|e| Error::Database(e.to_string()))?;
        }

        Ok((net_new.len(), duplicates, net_new))
    }
}

#[async_trait]
impl RawStore for SqliteRawStore {
    async fn merge(&self, records: Vec<IntervalRecord>) -> Result<MergeOutcome> {
        let mut groups: std::collections::BTreeMap<(EntityId, Cadence), Vec<IntervalRecord>> =
            std::collections::BTreeMap::new();
        for record in records {
            groups
                .entry((record.entity_id.clone(), record.cadence))
                .or_default()
                .push(record);
        }

        let mut outcome = MergeOutcome::default();
        let mut merged: Vec<IntervalRecord> = Vec::new();
        for ((entity, cadence), group) in groups {
            let (inserted, duplicates, net_new) =
                self.merge_entity_group(&entity, cadence, group).await?;
            outcome.inserted += inserted;
            outcome.duplicates += duplicates;
            if inserted > 0 {
                outcome.entities.push(entity);
            }
            merged.extend(net_new);
        }
        outcome.span = MergeOutcome::span_of(&merged);
        Ok(outcome)
    }

    async fn fetch_range(
        &self,
        entity: &EntityId,
        cadence: Cadence,
        range: &TimeRange,
    ) -> Result<Vec<IntervalRecord>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<IntervalRow> = interval_records::table
            .filter(interval_records::entity_id.eq(entity.as_str()))
            .filter(interval_records::cadence_minutes.eq(cadence.minutes() as i32))
            .filter(interval_records::observed_at.ge(fmt_ts(range.start())))
            .filter(interval_records::observed_at.lt(fmt_ts(range.end())))
            .order(interval_records::observed_at.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(IntervalRow::into_record).collect()
    }

    async fn count_day(&self, entity: &EntityId, cadence: Cadence, day: NaiveDate) -> Result<usize> {
        let range = TimeRange::day(day);
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let count: i64 = interval_records::table
            .filter(interval_records::entity_id.eq(entity.as_str()))
            .filter(interval_records::cadence_minutes.eq(cadence.minutes() as i32))
            .filter(interval_records::observed_at.ge(fmt_ts(range.start())))
            .filter(interval_records::observed_at.lt(fmt_ts(range.end())))
            .count()
            .get_result(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(count as usize)
    }

    async fn fetch_all(&self, entity: &EntityId, cadence: Cadence) -> Result<Vec<IntervalRecord>> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e| Error::Connection(e.to_string()))?;

        let rows: Vec<IntervalRow> = interval_records::table
            .filter(interval_records::entity_id.eq(entity.as_str()))
            .filter(interval_records::cadence_minutes.eq(cadence.minutes() as i32))
            .order(interval_records::observed_at.asc())
            .load(&mut conn)
            .map_err(|e| Error::Database(e.to_string()))?;

        rows.into_iter().map(IntervalRow::into_record).collect()
    }
}
