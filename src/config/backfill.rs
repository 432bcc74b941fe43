//! Backfill retry, timeout and concurrency configuration.

use serde::Deserialize;

/// Tuning for archive fetches during reconciliation.
///
/// Retries use exponential backoff with jitter; the worker limit bounds
/// concurrent fetches so archive-source rate limits are respected.
#[derive(Debug, Clone, Deserialize)]
pub struct BackfillConfig {
    /// Total attempts per (entity, day) unit, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on the backoff delay (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied to the delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Hard timeout on a single archive fetch (milliseconds).
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Maximum concurrent fetches across (entity, day) units.
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent_fetches() -> usize {
    num_cpus::get().clamp(2, 8)
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}
