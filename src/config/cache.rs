//! Aggregation cache configuration.

use std::time::Duration;

use serde::Deserialize;

/// Aggregation cache tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Entry time-to-live in seconds.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_ttl_secs() -> u64 {
    300
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}
