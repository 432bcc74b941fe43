//! Application configuration loading and validation.
//!
//! Aggregates all settings for the pipeline: store backend, archive
//! endpoint, backfill tuning, cache TTL, logging and the declared entity
//! registry. Loaded from a TOML file; invalid values are rejected at load
//! time rather than coerced.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use super::backfill::BackfillConfig;
use super::cache::CacheConfig;
use super::logging::LoggingConfig;
use super::store::StoreConfig;
use crate::domain::{Cadence, EntityId, EntityRegistry, EntitySpec, SourceId, TelemetryKind};
use crate::error::{ConfigError, Result};

/// Archive collaborator endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Base URL of the archive REST API.
    #[serde(default = "default_archive_base_url")]
    pub base_url: String,
}

fn default_archive_base_url() -> String {
    "https://archive.gridflux.dev/api/v1".into()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_archive_base_url(),
        }
    }
}

/// One declared entity in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDecl {
    pub id: String,
    pub source: String,
    pub kind: TelemetryKind,
    pub cadence_minutes: Cadence,
}

/// Main application configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub backfill: BackfillConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Declared telemetry entities.
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDecl>,
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Initialize logging from the loaded configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Build the entity registry from the declarations.
    #[must_use]
    pub fn registry(&self) -> EntityRegistry {
        EntityRegistry::new(self.entities.iter().map(|decl| EntitySpec {
            entity_id: EntityId::new(&decl.id),
            source: SourceId::new(&decl.source),
            kind: decl.kind,
            cadence: decl.cadence_minutes,
        }))
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.archive.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "archive.base_url",
            reason: e.to_string(),
        })?;

        if self.backfill.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backfill.max_attempts",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.backfill.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backfill.backoff_multiplier",
                reason: format!("must be >= 1.0, got {}", self.backfill.backoff_multiplier),
            }
            .into());
        }
        if self.backfill.max_concurrent_fetches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backfill.max_concurrent_fetches",
                reason: "must be at least 1".into(),
            }
            .into());
        }
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.ttl_secs",
                reason: "must be at least 1 second".into(),
            }
            .into());
        }

        let mut seen = std::collections::HashSet::new();
        for decl in &self.entities {
            if !seen.insert(decl.id.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "entity.id",
                    reason: format!("entity '{}' declared twice", decl.id),
                }
                .into());
            }
        }

        Ok(())
    }
}
