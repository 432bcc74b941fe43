//! Raw store backend selection.

use std::path::PathBuf;

use serde::Deserialize;

/// Which computation backend serves analytical queries.
///
/// Both sit behind the same store contract; this is a constructor-time
/// deployment choice, never a per-call branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStrategy {
    /// Load the full on-disk dataset into a resident in-memory store at
    /// startup and serve every slice from memory.
    Eager,
    /// Read only the requested slice from on-disk storage per query.
    #[default]
    Lazy,
}

/// Raw store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub strategy: StoreStrategy,
    /// SQLite database path; defaults under the platform data directory.
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("gridflux")
        .join("gridflux.db")
}

impl StoreConfig {
    /// Database URL in the form Diesel's SQLite backend expects.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!("sqlite://{}", self.database_path.display())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strategy: StoreStrategy::default(),
            database_path: default_database_path(),
        }
    }
}
