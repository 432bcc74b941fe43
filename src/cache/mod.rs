//! Memoization of full pipeline results keyed by query.
//!
//! Each distinct query key is guarded by its own in-flight slot: under
//! concurrent identical requests the computation runs exactly once and
//! later callers await the first result. Entries are immutable once
//! created, expire after a TTL, and are removed outright when a raw
//! store merge overlaps their range.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::debug;

use crate::config::CacheConfig;
use crate::domain::{CacheStatus, Coverage, EntityId, QueryKey, TimeRange};
use crate::error::{Error, Result};

/// Fully computed pipeline output held by a cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedResult {
    pub points: Vec<(DateTime<Utc>, Option<f64>)>,
    pub coverage: Coverage,
}

/// One immutable cache entry. Invalidation removes entries; nothing ever
/// mutates one in place.
#[derive(Debug, Clone)]
struct CacheEntry {
    result: Arc<MaterializedResult>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn fresh(&self) -> bool {
        self.created_at.elapsed() < self.ttl
    }
}

#[derive(Debug, Clone)]
enum FlightState {
    Pending,
    Done(std::result::Result<Arc<MaterializedResult>, Arc<Error>>),
}

/// Query-keyed result cache with per-key single-flight computation.
///
/// Explicitly constructed and passed to query handlers; the backing
/// computation strategy lives behind the store the caller composes in,
/// so the cache itself never branches on deployment mode.
pub struct AggregationCache {
    entries: DashMap<QueryKey, CacheEntry>,
    in_flight: DashMap<QueryKey, Arc<watch::Sender<FlightState>>>,
    ttl: Duration,
}

impl AggregationCache {
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttl(config.ttl())
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            ttl,
        }
    }

    /// Serve from cache or run `compute` exactly once per key.
    ///
    /// Concurrent callers with the same key await the in-flight
    /// computation; a computation failure is delivered to every waiter
    /// and nothing is cached. A cancelled leader wakes waiters, which
    /// re-elect a leader; no shared state is left half-written.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: QueryKey,
        compute: F,
    ) -> Result<(Arc<MaterializedResult>, CacheStatus)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<MaterializedResult>>,
    {
        let mut compute = Some(compute);
        loop {
            if let Some(result) = self.lookup(&key) {
                return Ok((result, CacheStatus::Hit));
            }

            enum Role {
                Leader(Arc<watch::Sender<FlightState>>),
                Follower(watch::Receiver<FlightState>),
            }

            let role = match self.in_flight.entry(key.clone()) {
                Entry::Occupied(occupied) => Role::Follower(occupied.get().subscribe()),
                Entry::Vacant(vacant) => {
                    let (tx, _rx) = watch::channel(FlightState::Pending);
                    let tx = Arc::new(tx);
                    vacant.insert(Arc::clone(&tx));
                    Role::Leader(tx)
                }
            };

            match role {
                Role::Leader(tx) => {
                    // Dropping the guard (cancellation included) clears the
                    // slot and closes the channel, waking any followers.
                    let guard = FlightGuard {
                        map: &self.in_flight,
                        key: &key,
                    };

                    let compute = compute.take().expect("leader elected twice");
                    let outcome = compute().await;

                    return match outcome {
                        Ok(result) => {
                            let result = Arc::new(result);
                            self.entries.insert(
                                key.clone(),
                                CacheEntry {
                                    result: Arc::clone(&result),
                                    created_at: Instant::now(),
                                    ttl: self.ttl,
                                },
                            );
                            drop(guard);
                            let _ = tx.send(FlightState::Done(Ok(Arc::clone(&result))));
                            Ok((result, CacheStatus::Miss))
                        }
                        Err(err) => {
                            let shared = Arc::new(err);
                            drop(guard);
                            let _ = tx.send(FlightState::Done(Err(Arc::clone(&shared))));
                            Err(Error::CacheCompute(shared))
                        }
                    };
                }
                Role::Follower(mut rx) => {
                    let joined = loop {
                        let state = rx.borrow_and_update().clone();
                        match state {
                            FlightState::Done(Ok(result)) => break Some(Ok(result)),
                            FlightState::Done(Err(err)) => break Some(Err(err)),
                            FlightState::Pending => {
                                if rx.changed().await.is_err() {
                                    // Leader cancelled before finishing;
                                    // retry from the top.
                                    break None;
                                }
                            }
                        }
                    };

                    match joined {
                        Some(Ok(result)) => {
                            return Ok((result, CacheStatus::InFlightJoined));
                        }
                        Some(Err(err)) => return Err(Error::CacheCompute(err)),
                        None => continue,
                    }
                }
            }
        }
    }

    /// Remove every entry whose key set intersects `entities` and whose
    /// range overlaps `span`. Returns the number of entries evicted.
    pub fn invalidate_overlapping(&self, entities: &[EntityId], span: &TimeRange) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| {
            let touches_entity = key.entities.iter().any(|e| entities.contains(e));
            !(touches_entity && key.range.overlaps(span))
        });
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "Evicted cache entries overlapping merged span");
        }
        evicted
    }

    /// Number of live (possibly expired, not yet reaped) entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, key: &QueryKey) -> Option<Arc<MaterializedResult>> {
        {
            let entry = self.entries.get(key)?;
            if entry.fresh() {
                return Some(Arc::clone(&entry.result));
            }
        }
        // Expiry removes the entry; a later computation creates a new one.
        self.entries.remove_if(key, |_, entry| !entry.fresh());
        None
    }
}

/// Clears a key's in-flight slot when the leader finishes or is dropped.
struct FlightGuard<'a> {
    map: &'a DashMap<QueryKey, Arc<watch::Sender<FlightState>>>,
    key: &'a QueryKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(self.key);
    }
}
